//! In-memory entry store.
//!
//! The corpus lives in an immutable [`CorpusSnapshot`], grouped by classifier
//! type with the vector matrix of every scope built up front. The
//! [`EntryStore`] hands out the current snapshot behind an `Arc`; a reload
//! replaces it in one swap, so a reader holds either the old corpus or the
//! new one, never a mix.

use crate::error::DataAccessError;
use crate::models::Entry;
use crate::ranker::VectorMatrix;
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// The capability set every corpus source provides.
pub trait EntrySource: Send + Sync {
    fn list_classifier_types(&self) -> Result<Vec<String>, DataAccessError>;

    fn list_categories(&self, classifier_type: Option<&str>)
        -> Result<Vec<String>, DataAccessError>;

    /// Entries of one classifier, or of all classifiers when `None`.
    ///
    /// Separate `load_entries` and `load_vectors` calls may straddle a
    /// reload. Callers that need both use [`load_scope`](Self::load_scope).
    fn load_entries(&self, classifier_type: Option<&str>) -> Result<Vec<Entry>, DataAccessError>;

    /// Row `i` belongs to `load_entries(classifier_type)[i]` when both read
    /// the same snapshot.
    fn load_vectors(&self, classifier_type: Option<&str>)
        -> Result<Vec<Vec<f32>>, DataAccessError>;

    /// Entries and matrix taken from a single snapshot, always aligned.
    fn load_scope(&self, classifier_type: Option<&str>) -> Result<Arc<Scope>, DataAccessError>;
}

/// Entries of one classifier scope and their aligned vector matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub entries: Vec<Entry>,
    pub matrix: VectorMatrix,
}

impl Scope {
    fn build(dimensions: usize, entries: Vec<Entry>) -> Result<Self, DataAccessError> {
        let matrix = VectorMatrix::from_entries(dimensions, &entries)?;
        Ok(Self { entries, matrix })
    }

    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug)]
pub struct CorpusSnapshot {
    dimensions: usize,
    model_id: String,
    all: Arc<Scope>,
    by_classifier: BTreeMap<String, Arc<Scope>>,
    empty: Arc<Scope>,
}

impl CorpusSnapshot {
    /// Groups `entries` by classifier type, keeping their relative order.
    /// Fails if any vector does not have `dimensions` components.
    pub fn build(
        dimensions: usize,
        model_id: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Result<Self, DataAccessError> {
        let mut grouped: BTreeMap<String, Vec<Entry>> = BTreeMap::new();
        for entry in &entries {
            grouped
                .entry(entry.classifier_type.clone())
                .or_default()
                .push(entry.clone());
        }
        let all = Arc::new(Scope::build(dimensions, entries)?);
        let mut by_classifier = BTreeMap::new();
        for (classifier, entries) in grouped {
            by_classifier.insert(classifier, Arc::new(Scope::build(dimensions, entries)?));
        }
        Ok(Self {
            dimensions,
            model_id: model_id.into(),
            all,
            by_classifier,
            empty: Arc::new(Scope {
                entries: Vec::new(),
                matrix: VectorMatrix::empty(dimensions),
            }),
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn len(&self) -> usize {
        self.all.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.entries.is_empty()
    }

    /// An unknown classifier yields an empty scope.
    pub fn scope(&self, classifier_type: Option<&str>) -> Arc<Scope> {
        match classifier_type {
            None => Arc::clone(&self.all),
            Some(classifier) => self
                .by_classifier
                .get(classifier)
                .cloned()
                .unwrap_or_else(|| Arc::clone(&self.empty)),
        }
    }

    pub fn classifier_types(&self) -> Vec<String> {
        self.by_classifier.keys().cloned().collect()
    }
}

/// Loads every code from the database into a snapshot.
///
/// Each row must already carry a vector produced by `model_id`; a corpus
/// that is only partly embedded is refused rather than served.
pub async fn load_snapshot(
    pool: &SqlitePool,
    dimensions: usize,
    model_id: &str,
) -> Result<CorpusSnapshot, DataAccessError> {
    let rows = storage::fetch_codes(pool, None).await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let vector = match row.decode_vector()? {
            Some(vector) if row.model_id.as_deref() == Some(model_id) => vector,
            _ => {
                return Err(DataAccessError::NotEmbedded {
                    classifier_type: row.classifier_type,
                    code: row.code,
                    model_id: model_id.to_string(),
                })
            }
        };
        entries.push(Entry {
            code: row.code,
            description: row.description,
            category: row.category,
            classifier_type: row.classifier_type,
            vector,
        });
    }
    debug!(count = entries.len(), "building corpus snapshot");
    CorpusSnapshot::build(dimensions, model_id, entries)
}

/// Holds the current corpus snapshot.
#[derive(Debug, Default)]
pub struct EntryStore {
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CorpusSnapshot) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    /// Installs `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: CorpusSnapshot) -> Option<Arc<CorpusSnapshot>> {
        info!(
            entries = snapshot.len(),
            classifiers = snapshot.by_classifier.len(),
            model = snapshot.model_id(),
            "corpus snapshot installed"
        );
        self.current.write().replace(Arc::new(snapshot))
    }

    pub fn snapshot(&self) -> Result<Arc<CorpusSnapshot>, DataAccessError> {
        self.current
            .read()
            .as_ref()
            .cloned()
            .ok_or(DataAccessError::Uninitialized)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

impl EntrySource for EntryStore {
    fn list_classifier_types(&self) -> Result<Vec<String>, DataAccessError> {
        Ok(self.snapshot()?.classifier_types())
    }

    fn list_categories(
        &self,
        classifier_type: Option<&str>,
    ) -> Result<Vec<String>, DataAccessError> {
        Ok(self.snapshot()?.scope(classifier_type).categories())
    }

    fn load_entries(&self, classifier_type: Option<&str>) -> Result<Vec<Entry>, DataAccessError> {
        Ok(self.snapshot()?.scope(classifier_type).entries.clone())
    }

    fn load_vectors(
        &self,
        classifier_type: Option<&str>,
    ) -> Result<Vec<Vec<f32>>, DataAccessError> {
        Ok(self.snapshot()?.scope(classifier_type).matrix.to_rows())
    }

    fn load_scope(&self, classifier_type: Option<&str>) -> Result<Arc<Scope>, DataAccessError> {
        Ok(self.snapshot()?.scope(classifier_type))
    }
}
