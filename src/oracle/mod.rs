//! Language-model oracle
//!
//! Answer generation and every yes/no judgement go through the same
//! `Oracle` contract. Backends:
//! - `openai`: chat completions API
//! - `ollama`: local Ollama `/api/chat`
//!
//! `retry` wraps a backend with backoff for transient failures and
//! `classify` holds the single yes/no parsing rule.

pub mod classify;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod types;

pub use classify::{is_affirmative, YesNoClassifier};
pub use ollama::OllamaOracle;
pub use openai::OpenAiOracle;
pub use retry::{RetryPolicy, RetryingOracle};
pub use types::{ChatMessage, CompletionOptions, Role};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, OracleBackend};
use crate::errors::{Result, TutorError};

/// Text-completion collaborator
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Build the configured backend wrapped in the retry policy
pub fn from_config(config: &Config) -> Result<Arc<dyn Oracle>> {
    let oracle_config = &config.oracle;
    let timeout = Duration::from_secs(oracle_config.request_timeout_secs);
    let policy = RetryPolicy::new(
        oracle_config.max_retries,
        Duration::from_millis(oracle_config.retry_base_delay_ms),
    );

    match oracle_config.backend {
        OracleBackend::OpenAi => {
            let api_key = config.api_key().ok_or_else(|| {
                TutorError::ConfigError(format!(
                    "{} must be set for the OpenAI oracle",
                    oracle_config.api_key_env
                ))
            })?;
            let mut oracle = OpenAiOracle::new(api_key, &oracle_config.model, timeout)?;
            if let Some(url) = &oracle_config.base_url {
                oracle = oracle.with_base_url(url);
            }
            Ok(Arc::new(RetryingOracle::new(oracle, policy)))
        }
        OracleBackend::Ollama => {
            let base_url = oracle_config
                .base_url
                .as_deref()
                .unwrap_or(ollama::DEFAULT_OLLAMA_URL);
            let oracle = OllamaOracle::new(base_url, &oracle_config.model, timeout)?;
            Ok(Arc::new(RetryingOracle::new(oracle, policy)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_backend_needs_no_key() {
        let mut config = Config::default();
        config.oracle.backend = OracleBackend::Ollama;
        config.oracle.model = "qwen2.5:7b-instruct".to_string();

        let oracle = from_config(&config).unwrap();
        assert_eq!(oracle.name(), "ollama");
    }

    #[test]
    fn test_openai_backend_requires_key() {
        let mut config = Config::default();
        config.oracle.api_key_env = "COURSEBUDDY_TEST_UNSET_KEY".to_string();

        let result = from_config(&config);
        assert!(matches!(result, Err(TutorError::ConfigError(_))));
    }
}
