//! OpenAI embeddings backend, for indexes built with `embedding_method=openai`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::embedding::{ensure_text, Embedder};
use crate::errors::{Result, TutorError};

const BACKEND: &str = "openai";

/// The default OpenAI embeddings API endpoint
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedder calling the `/v1/embeddings` endpoint
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>, model: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TutorError::embedding(BACKEND, "API key must not be empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TutorError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            url: OPENAI_EMBEDDINGS_URL.to_string(),
        })
    }

    /// Point at an OpenAI-compatible endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Output dimension of the known OpenAI embedding models
pub(crate) fn model_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_text(BACKEND, text)?;

        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        debug!(model = %self.model, chars = text.len(), "Requesting embedding");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::embedding(BACKEND, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(TutorError::embedding(BACKEND, format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| TutorError::embedding(BACKEND, format!("bad response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| TutorError::embedding(BACKEND, "response contained no embeddings"))
    }

    fn dimension(&self) -> usize {
        model_dimension(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedder() -> OpenAiEmbedder {
        OpenAiEmbedder::new("sk-test", "text-embedding-ada-002", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_empty_key() {
        let result = OpenAiEmbedder::new("  ", "text-embedding-ada-002", Duration::from_secs(5));
        assert!(matches!(result, Err(TutorError::Embedding { .. })));
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(embedder().dimension(), 1536);
        let large = OpenAiEmbedder::new("sk-test", "text-embedding-3-large", Duration::from_secs(5)).unwrap();
        assert_eq!(large.dimension(), 3072);
    }

    #[tokio::test]
    async fn test_empty_text_fails_before_request() {
        // Unroutable URL: the call must fail on validation, not on the network.
        let embedder = embedder().with_url("http://127.0.0.1:9/v1/embeddings");
        let err = embedder.embed("  ").await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_request_serialization() {
        let request = EmbeddingRequest {
            model: "text-embedding-ada-002",
            input: vec!["hello"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][0], "hello");
    }
}
