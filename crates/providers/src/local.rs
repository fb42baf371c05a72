//! Adapter for in-process models that need exclusive access while embedding.

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};
use parking_lot::Mutex;

/// An in-process embedding model. Takes `&mut self` because most local
/// models keep scratch buffers or session state between calls.
pub trait LocalModel: Send {
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, ProviderError>;
    fn model_id(&self) -> String;
}

/// Wraps a [`LocalModel`] behind a mutex so concurrent searches take turns.
///
/// The lock is never held across an await point.
pub struct LocalProvider<M> {
    model: Mutex<M>,
}

impl<M: LocalModel> LocalProvider<M> {
    pub fn new(model: M) -> Self {
        Self {
            model: Mutex::new(model),
        }
    }
}

impl<M> std::fmt::Debug for LocalProvider<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvider")
            .field("model", &"<local model>")
            .finish()
    }
}

#[async_trait::async_trait]
impl<M: LocalModel + 'static> EmbeddingProvider for LocalProvider<M> {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let mut model = self.model.lock();
        let vectors = texts
            .iter()
            .map(|text| model.embed_one(text))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EmbedResponse { vectors })
    }

    fn model_id(&self) -> String {
        self.model.lock().model_id()
    }
}
