//! Ollama chat backend
//!
//! Non-streaming `POST /api/chat` against a local Ollama server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::{Result, TutorError};
use crate::oracle::types::{ChatMessage, CompletionOptions};
use crate::oracle::Oracle;

const BACKEND: &str = "ollama";

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Ollama chat client
#[derive(Debug, Clone)]
pub struct OllamaOracle {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaOracle {
    /// Create Ollama oracle with custom configuration
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TutorError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

impl OllamaOptions {
    fn from_completion(options: &CompletionOptions) -> Option<Self> {
        if options.max_tokens.is_none() && options.temperature.is_none() {
            return None;
        }
        Some(Self {
            num_predict: options.max_tokens,
            temperature: options.temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl Oracle for OllamaOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions::from_completion(options),
        };

        debug!(model = %self.model, messages = messages.len(), "Calling Ollama chat");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::request(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TutorError::oracle_status(BACKEND, status.as_u16(), error_text));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| TutorError::oracle(BACKEND, format!("Failed to parse response: {}", e)))?;

        Ok(parsed.message.content)
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
