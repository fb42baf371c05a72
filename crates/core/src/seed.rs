//! Corpus seeding: the built-in ICD-10 sample and JSON corpus files.

use crate::models::{CorpusEntry, DEFAULT_CLASSIFIER};
use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::Path;
use storage::{NewCode, StorageError, UpsertOutcome};
use tracing::{info, warn};

const SAMPLE: &[(&str, &str, &str)] = &[
    ("A00.0", "Cholera due to Vibrio cholerae 01, biovar cholerae", "Infectious diseases"),
    ("A00.1", "Cholera due to Vibrio cholerae 01, biovar eltor", "Infectious diseases"),
    ("A00.9", "Cholera, unspecified", "Infectious diseases"),
    ("B01.0", "Varicella meningitis", "Viral infections"),
    ("B01.1", "Varicella encephalitis", "Viral infections"),
    ("B01.9", "Varicella without complication", "Viral infections"),
    ("C50.1", "Malignant neoplasm of central portion of breast", "Neoplasms"),
    ("C50.2", "Malignant neoplasm of upper-inner quadrant of breast", "Neoplasms"),
    ("C50.9", "Malignant neoplasm of breast, unspecified", "Neoplasms"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Nine ICD-10 codes across three categories.
pub fn sample_corpus() -> Vec<CorpusEntry> {
    SAMPLE
        .iter()
        .map(|(code, description, category)| CorpusEntry {
            code: (*code).to_string(),
            description: (*description).to_string(),
            category: (*category).to_string(),
            classifier_type: DEFAULT_CLASSIFIER.to_string(),
        })
        .collect()
}

/// Reads a JSON array of `{code, description, category, classifier_type?}`.
pub fn load_corpus_file(path: &Path) -> anyhow::Result<Vec<CorpusEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read corpus {}", path.display()))?;
    let entries: Vec<CorpusEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parse corpus {}", path.display()))?;
    Ok(entries)
}

pub fn description_hash(description: &str) -> String {
    blake3::hash(description.as_bytes()).to_hex().to_string()
}

/// Upserts every entry. Entries with a blank code or classifier are skipped.
pub async fn seed_corpus(
    pool: &SqlitePool,
    entries: &[CorpusEntry],
) -> Result<SeedSummary, StorageError> {
    let mut summary = SeedSummary::default();
    for entry in entries {
        if entry.code.trim().is_empty() || entry.classifier_type.trim().is_empty() {
            warn!(
                code = %entry.code,
                classifier = %entry.classifier_type,
                "skipping corpus entry without identity"
            );
            summary.skipped += 1;
            continue;
        }
        let hash = description_hash(&entry.description);
        let new = NewCode {
            classifier_type: &entry.classifier_type,
            code: &entry.code,
            description: &entry.description,
            category: &entry.category,
            description_hash: &hash,
        };
        match storage::upsert_code(pool, &new).await? {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
            UpsertOutcome::Unchanged => summary.unchanged += 1,
        }
    }
    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        "corpus seeded"
    );
    Ok(summary)
}
