use crate::{EmbedResponse, EmbeddingProvider, ProviderError};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    /// Requested output size; omitted from the request when `None`.
    pub dimensions: Option<usize>,
}

/// Remote embeddings over the OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<usize>,
        }

        if texts.is_empty() {
            return Ok(EmbedResponse { vectors: vec![] });
        }

        debug!(count = texts.len(), model = %self.cfg.embedding_model, "requesting embeddings");
        let body = EmbedRequest {
            model: &self.cfg.embedding_model,
            input: texts,
            dimensions: self.cfg.dimensions,
        };

        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.cfg.base_url))
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }

        let mut parsed: EmbeddingApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if parsed.data.len() != texts.len() {
            return Err(ProviderError::RequestFailed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        // The API does not promise response order.
        parsed.data.sort_by_key(|d| d.index);

        Ok(EmbedResponse {
            vectors: parsed.data.into_iter().map(|d| d.embedding).collect(),
        })
    }

    fn model_id(&self) -> String {
        match self.cfg.dimensions {
            Some(dims) => format!("openai:{}/{}", self.cfg.embedding_model, dims),
            None => format!("openai:{}", self.cfg.embedding_model),
        }
    }
}
