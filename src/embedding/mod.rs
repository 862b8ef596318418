//! Query-time text embedding
//!
//! The embedder must be the same model that built the index, otherwise
//! distances are meaningless. `from_settings` picks it from the course
//! settings shared with the ingestion scripts.

pub mod engine;
pub mod openai;

pub use engine::MiniLmEmbedder;
pub use openai::OpenAiEmbedder;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{Result, TutorError};
use crate::settings::EmbeddingChoice;

/// Maps text to a fixed-dimension vector.
///
/// Deterministic for a fixed model; empty input is an error.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimension
    fn dimension(&self) -> usize;
}

/// Reject empty input before touching a backend
pub(crate) fn ensure_text(backend: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TutorError::embedding(backend, "input text is empty"));
    }
    Ok(())
}

/// Run CPU-bound encoding on the blocking pool so other turns keep their worker
pub(crate) async fn off_runtime<T, F>(backend: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TutorError::embedding(backend, format!("embedding task failed: {}", e)))?
}

/// Build the embedder matching the index build settings
pub fn from_settings(
    choice: &EmbeddingChoice,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Arc<dyn Embedder>> {
    match choice {
        EmbeddingChoice::SentenceTransformer { model } => {
            Ok(Arc::new(MiniLmEmbedder::new(model)?))
        }
        EmbeddingChoice::OpenAi { model } => {
            let key = api_key.ok_or_else(|| {
                TutorError::ConfigError(
                    "an API key is required for OpenAI embeddings".to_string(),
                )
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(key, model, timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_text() {
        assert!(ensure_text("test", "hello").is_ok());
        assert!(matches!(
            ensure_text("test", "   \n"),
            Err(TutorError::Embedding { .. })
        ));
    }

    #[tokio::test]
    async fn test_encoding_leaves_runtime_free() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        // Single-threaded runtime: the ticker only advances if encoding is off the worker.
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let vector = off_runtime("test", || {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![1.0f32, 0.0])
        })
        .await
        .unwrap();
        ticker.abort();

        assert_eq!(vector, vec![1.0, 0.0]);
        assert!(ticks.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn test_encoding_panic_becomes_error() {
        let result: Result<Vec<f32>> = off_runtime("test", || panic!("tokenizer blew up")).await;
        assert!(matches!(result, Err(TutorError::Embedding { ref backend, .. }) if backend == "test"));
    }

    #[test]
    fn test_openai_choice_requires_key() {
        let choice = EmbeddingChoice::OpenAi {
            model: "text-embedding-ada-002".to_string(),
        };
        let result = from_settings(&choice, None, Duration::from_secs(5));
        assert!(matches!(result, Err(TutorError::ConfigError(_))));
    }

    #[test]
    fn test_openai_choice_with_key() {
        let choice = EmbeddingChoice::OpenAi {
            model: "text-embedding-ada-002".to_string(),
        };
        let embedder = from_settings(&choice, Some("sk-test".to_string()), Duration::from_secs(5)).unwrap();
        assert_eq!(embedder.dimension(), 1536);
    }
}
