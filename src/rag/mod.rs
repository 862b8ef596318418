//! Retrieval-augmented prompting
//!
//! - `retrieval`: question text to a context block via embedder + index
//! - `prompt`: mode-specific instructions and message assembly

pub mod prompt;
pub mod retrieval;

pub use prompt::{Prompt, PromptBuilder, CONTEXT_HEADER};
pub use retrieval::{RetrievalOrchestrator, RetrievedContext, CHUNK_SEPARATOR};
