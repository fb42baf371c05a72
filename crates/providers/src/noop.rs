use crate::{EmbedResponse, EmbeddingProvider, ProviderError};

/// Returns all-zero vectors. Every entry scores 0 against every query.
#[derive(Debug, Clone)]
pub struct NoopProvider {
    dimensions: usize,
}

impl NoopProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Ok(EmbedResponse {
            vectors: vec![vec![0.0; self.dimensions]; texts.len()],
        })
    }

    fn model_id(&self) -> String {
        format!("noop/{}", self.dimensions)
    }
}
