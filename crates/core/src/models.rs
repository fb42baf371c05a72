use serde::{Deserialize, Serialize};

/// Classifier assigned to corpus records that do not name one.
pub const DEFAULT_CLASSIFIER: &str = "ICD-10";

/// One embedded code, as held by the entry store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub code: String,
    pub description: String,
    pub category: String,
    pub classifier_type: String,
    pub vector: Vec<f32>,
}

/// A search hit handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub code: String,
    pub description: String,
    pub category: String,
    pub classifier_type: String,
    pub score: f32,
}

impl ResultRecord {
    pub fn from_entry(entry: &Entry, score: f32) -> Self {
        Self {
            code: entry.code.clone(),
            description: entry.description.clone(),
            category: entry.category.clone(),
            classifier_type: entry.classifier_type.clone(),
            score,
        }
    }
}

/// A code as it appears in a seed corpus, before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub code: String,
    pub description: String,
    pub category: String,
    #[serde(default = "default_classifier")]
    pub classifier_type: String,
}

fn default_classifier() -> String {
    DEFAULT_CLASSIFIER.to_string()
}
