//! The query pipeline: embed, load the classifier scope, rank, format.

use crate::embeddings::Embedder;
use crate::error::{DataAccessError, SearchError, ValidationError};
use crate::models::ResultRecord;
use crate::ranker;
use crate::store::EntrySource;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_TOP_K: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(k) => k,
    None => unreachable!(),
};

/// Maps the UI's "all categories" choice to no filter. Blank values also
/// mean no filter; anything else passes through untouched.
pub fn normalize_category(category: Option<&str>, all_label: &str) -> Option<String> {
    match category {
        None => None,
        Some(c) if c.is_empty() || c == all_label => None,
        Some(c) => Some(c.to_string()),
    }
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    classifier_type: Option<String>,
    category: Option<String>,
    top_k: NonZeroUsize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Result<Self, ValidationError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(Self {
            query,
            classifier_type: None,
            category: None,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn with_classifier(mut self, classifier_type: Option<String>) -> Self {
        self.classifier_type = classifier_type;
        self
    }

    /// Exact, case-sensitive filter. Callers normalize "All" beforehand.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Result<Self, ValidationError> {
        self.top_k = NonZeroUsize::new(top_k).ok_or(ValidationError::ZeroTopK)?;
        Ok(self)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn classifier_type(&self) -> Option<&str> {
        self.classifier_type.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn top_k(&self) -> NonZeroUsize {
        self.top_k
    }
}

/// Either the ranked records or the reason the search could not run.
#[derive(Debug)]
pub enum SearchOutcome {
    Ranked(Vec<ResultRecord>),
    Failed(SearchError),
}

impl SearchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            Self::Ranked(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    pub fn results(&self) -> &[ResultRecord] {
        match self {
            Self::Ranked(records) => records.as_slice(),
            Self::Failed(_) => &[],
        }
    }

    /// Records on success, an empty list on failure.
    pub fn into_results(self) -> Vec<ResultRecord> {
        match self {
            Self::Ranked(records) => records,
            Self::Failed(_) => Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct QueryPipeline {
    embedder: Embedder,
    source: Arc<dyn EntrySource>,
}

impl QueryPipeline {
    pub fn new(embedder: Embedder, source: Arc<dyn EntrySource>) -> Self {
        Self { embedder, source }
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Runs the search, propagating embedding and data-access failures.
    pub async fn try_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<ResultRecord>, SearchError> {
        let query_vector = self.embedder.embed(request.query()).await?;
        let scope = self.source.load_scope(request.classifier_type())?;
        debug!(
            scope = scope.entries.len(),
            classifier = request.classifier_type().unwrap_or("*"),
            "ranking"
        );
        let ranked = ranker::rank(
            &query_vector,
            &scope.entries,
            &scope.matrix,
            request.category(),
            request.top_k(),
        )?;
        Ok(ranked
            .into_iter()
            .map(|r| ResultRecord::from_entry(r.entry, r.score))
            .collect())
    }

    /// Runs the search and logs any failure with the request context.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        match self.try_search(request).await {
            Ok(records) => {
                info!(
                    query = request.query(),
                    results = records.len(),
                    "search completed"
                );
                SearchOutcome::Ranked(records)
            }
            Err(err) => {
                error!(
                    query = request.query(),
                    classifier = ?request.classifier_type(),
                    category = ?request.category(),
                    error = %err,
                    "search failed"
                );
                SearchOutcome::Failed(err)
            }
        }
    }

    /// Same as [`search`](Self::search) but hides failures behind an empty list.
    pub async fn search_or_empty(&self, request: &SearchRequest) -> Vec<ResultRecord> {
        self.search(request).await.into_results()
    }

    pub fn list_classifier_types(&self) -> Result<Vec<String>, DataAccessError> {
        self.source.list_classifier_types()
    }

    pub fn list_categories(
        &self,
        classifier_type: Option<&str>,
    ) -> Result<Vec<String>, DataAccessError> {
        self.source.list_categories(classifier_type)
    }
}
