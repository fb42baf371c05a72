use crate::error::EmbeddingError;
use providers::EmbeddingProvider;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared handle on the process-wide embedding model.
///
/// Pins the vector dimension and checks every vector the provider returns.
/// Blank text never reaches the provider and embeds to the zero vector.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    model_id: String,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("dimensions", &self.dimensions)
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
        let model_id = provider.model_id();
        Self {
            provider,
            dimensions,
            model_id,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            got: 0,
        })
    }

    /// Embeds `texts` in order with a single provider call.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = vec![vec![0.0; self.dimensions]; texts.len()];
        let (indices, pending): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .unzip();
        if pending.is_empty() {
            return Ok(out);
        }

        let resp = self.provider.embed(&pending).await?;
        if resp.vectors.len() != pending.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: pending.len(),
                got: resp.vectors.len(),
            });
        }
        for (index, vector) in indices.into_iter().zip(resp.vectors) {
            self.check(&vector)?;
            out[index] = vector;
        }
        Ok(out)
    }

    fn check(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::NonFinite);
        }
        Ok(())
    }
}

/// Embeds every code that has no vector for the current model.
///
/// Codes whose description and model are unchanged keep their stored
/// vector. Returns the number of codes embedded.
pub async fn run_embedder(
    pool: &SqlitePool,
    embedder: &Embedder,
    batch_size: usize,
) -> anyhow::Result<usize> {
    let pending = storage::pending_codes(pool, embedder.model_id()).await?;
    if pending.is_empty() {
        debug!("all codes embedded");
        return Ok(0);
    }
    info!(
        count = pending.len(),
        model = embedder.model_id(),
        "embedding codes"
    );

    let mut embedded = 0usize;
    for batch in pending.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|row| row.description.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        for (row, vector) in batch.iter().zip(vectors) {
            storage::store_vector(pool, row.id, &vector, embedder.model_id()).await?;
        }
        embedded += batch.len();
    }
    Ok(embedded)
}
