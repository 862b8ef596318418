//! CourseBuddy - course teaching assistant
//!
//! Answers student questions from a pre-built vector index of course
//! material, using a language model for classification, answering and
//! answer verification.
//!
//! # Architecture
//!
//! - **index / embedding**: read-only chunk index and the query embedder
//! - **oracle**: language-model backends, retry, yes/no classification
//! - **query / rag**: question modes, gates, retrieval and prompts
//! - **agent**: verification loop and the per-turn engine
//! - **session**: per-conversation context memory
//! - **cli / repl / doctor**: command-line surfaces

pub mod errors;
pub use errors::{Result, TutorError};

pub mod config;
pub mod settings;

pub mod embedding;
pub mod index;
pub mod oracle;

pub mod query;
pub mod rag;

pub mod agent;
pub mod session;
pub mod telemetry;

pub mod cli;
pub mod doctor;
pub mod repl;
