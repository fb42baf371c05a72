//! Error taxonomy for the search core.

use providers::ProviderError;
use storage::StorageError;
use thiserror::Error;

/// Rejected input. Raised at the boundary before a search runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no search query provided")]
    EmptyQuery,
    #[error("top_k must be at least 1")]
    ZeroTopK,
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("expected {expected}-dimensional vector, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("embedding contains a non-finite component")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("corpus has not been loaded")]
    Uninitialized,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{classifier_type}/{code} has no vector for model {model_id}")]
    NotEmbedded {
        classifier_type: String,
        code: String,
        model_id: String,
    },
    #[error("{classifier_type}/{code} has {got} components, corpus dimension is {expected}")]
    DimensionMismatch {
        classifier_type: String,
        code: String,
        expected: usize,
        got: usize,
    },
    #[error("{classifier_type}/{code} has a non-finite vector component")]
    NonFiniteVector {
        classifier_type: String,
        code: String,
    },
    #[error("{entries} entries but {rows} vector rows")]
    Misaligned { entries: usize, rows: usize },
    #[error("query has {got} components, corpus dimension is {expected}")]
    QueryDimension { expected: usize, got: usize },
}

/// A search that could not run to completion.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}
