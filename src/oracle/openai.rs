//! OpenAI chat completions backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::{Result, TutorError};
use crate::oracle::types::{ChatMessage, CompletionOptions};
use crate::oracle::Oracle;

const BACKEND: &str = "openai";

/// Default OpenAI API root
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Oracle backed by `/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>, model: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TutorError::ConfigError("OpenAI API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TutorError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            timeout,
        })
    }

    /// Use an OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!(model = %self.model, messages = messages.len(), "Calling chat completions");
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::request(e, self.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(TutorError::oracle_status(BACKEND, status.as_u16(), body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TutorError::oracle(BACKEND, format!("Failed to parse response: {}", e)))?;

        // A missing choice or null content reads as an empty reply.
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
