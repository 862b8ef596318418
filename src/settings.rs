//! Course settings store
//!
//! Reads the flat `key=value` settings file shared with the ingestion
//! scripts and derives the course profile used by the prompt templates.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{Result, TutorError};

/// Default assistant display name
pub const DEFAULT_ASSISTANT_NAME: &str = "Virtual Assistant";

/// Default local sentence-transformer model
pub const DEFAULT_SENTENCE_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default OpenAI embedding model used by the index build
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Raw settings, one entry per `key=value` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    /// Parse settings text.
    ///
    /// Blank lines, `#` comments and lines without `=` are skipped. The
    /// first `=` separates key from value; both sides are trimmed.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Self { values }
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TutorError::MissingResource(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Course details used by classification and prompt templates
    pub fn course_profile(&self) -> CourseProfile {
        CourseProfile {
            class_name: self.get_or("classname", "").to_string(),
            professor: self.get_or("professor", "").to_string(),
            assistants: self.get_or("assistants", "").to_string(),
            class_description: self.get_or("classdescription", "").to_string(),
            instructions: self.get_or("instructions", "").to_string(),
            assistant_name: self
                .get_or("assistantname", DEFAULT_ASSISTANT_NAME)
                .to_string(),
        }
    }

    /// Embedding backend the index was built with
    pub fn embedding_choice(&self) -> EmbeddingChoice {
        let method = self
            .get_or("embedding_method", "sentence-transformers")
            .to_lowercase();

        if method == "openai" {
            EmbeddingChoice::OpenAi {
                model: self
                    .get_or("openai_embedding_model", DEFAULT_OPENAI_EMBEDDING_MODEL)
                    .to_string(),
            }
        } else {
            EmbeddingChoice::SentenceTransformer {
                model: self
                    .get_or("sentence_transformer_model", DEFAULT_SENTENCE_MODEL)
                    .to_string(),
            }
        }
    }
}

/// Course metadata fed to the oracle templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseProfile {
    pub class_name: String,
    pub professor: String,
    pub assistants: String,
    pub class_description: String,
    /// Extra instructions appended to every system prompt
    pub instructions: String,
    pub assistant_name: String,
}

/// Query-time embedder matching the index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingChoice {
    SentenceTransformer { model: String },
    OpenAi { model: String },
}

impl EmbeddingChoice {
    pub fn describe(&self) -> String {
        match self {
            EmbeddingChoice::SentenceTransformer { model } => {
                format!("sentence-transformers ({})", model)
            }
            EmbeddingChoice::OpenAi { model } => format!("openai ({})", model),
        }
    }
}
