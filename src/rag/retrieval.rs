use std::sync::Arc;
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::errors::Result;
use crate::index::CourseIndex;

/// Separator between chunks in a context block
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Context block built from the nearest chunks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetrievedContext {
    pub text: String,
    /// Chunks that made it into `text`
    pub chunk_count: usize,
}

/// Turns question text into a context block
pub struct RetrievalOrchestrator {
    embedder: Arc<dyn Embedder>,
    index: Arc<CourseIndex>,
}

impl RetrievalOrchestrator {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<CourseIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &CourseIndex {
        &self.index
    }

    /// Embed `text`, take the `k` nearest chunks and join them
    pub async fn retrieve(&self, text: &str, k: usize) -> Result<RetrievedContext> {
        let vector = self.embedder.embed(text).await?;
        let chunks = self.index.nearest_texts(&vector, k)?;
        debug!(k, found = chunks.len(), "Nearest chunks retrieved");

        Ok(RetrievedContext {
            chunk_count: chunks.len(),
            text: chunks.join(CHUNK_SEPARATOR),
        })
    }

    /// Widened retrieval for a reply that failed verification.
    ///
    /// The question is mixed with the context already seen so the search
    /// lands near both.
    pub async fn retrieve_widened(
        &self,
        question: &str,
        previous_context: &str,
        k: usize,
    ) -> Result<RetrievedContext> {
        info!(k, "Retrieving alternate context");
        let mixed = format!("{} {}", question, previous_context);
        self.retrieve(&mixed, k).await
    }
}
