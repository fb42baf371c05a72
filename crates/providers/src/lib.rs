//! Embedding provider abstractions and the registry that selects one by name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod hashed;
pub mod local;
pub mod noop;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

/// Turns text into dense vectors.
///
/// Implementations are constructed once and shared across concurrent
/// searches, hence the `Send + Sync` bound. A provider backed by a model that
/// cannot be used concurrently must serialize access internally.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError>;

    /// Identifies the model and version. Stored vectors tagged with a
    /// different id are recomputed.
    fn model_id(&self) -> String;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    embeddings: HashMap<String, Arc<dyn EmbeddingProvider>>,
    pub preferred_embedding: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedding(mut self, name: &str, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_embedding(mut self, name: &str) -> Self {
        self.preferred_embedding = Some(name.to_string());
        self
    }

    pub fn embedding(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<dyn EmbeddingProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_embedding.clone())
            .ok_or_else(|| {
                ProviderError::UnknownProvider("no embedding provider configured".into())
            })?;
        self.embeddings
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.embeddings.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopProvider;

    #[test]
    fn registry_falls_back_to_preferred() {
        let reg = ProviderRegistry::new()
            .with_embedding("noop", Arc::new(NoopProvider::new(4)))
            .set_preferred_embedding("noop");
        assert!(reg.embedding(None).is_ok());
        assert!(matches!(
            reg.embedding(Some("missing")),
            Err(ProviderError::UnknownProvider(name)) if name == "missing"
        ));
    }

    #[test]
    fn registry_without_preference_errors() {
        let reg = ProviderRegistry::new().with_embedding("noop", Arc::new(NoopProvider::new(4)));
        assert!(reg.embedding(None).is_err());
        assert_eq!(reg.names(), vec!["noop".to_string()]);
    }
}
