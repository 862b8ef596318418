use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, TutorError};

/// How a question is answered, fixed once at turn entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionMode {
    /// Answer from retrieved context
    Normal,
    /// Generate a quiz question on the topic (`m:` prefix)
    MultipleChoice,
    /// Judge an answer to the previous quiz question (`a:` prefix)
    AnswerCheck,
}

impl QuestionMode {
    /// Whether the retrieved context is remembered after the turn
    pub fn updates_session(&self) -> bool {
        !matches!(self, QuestionMode::AnswerCheck)
    }

    /// Whether the reply goes through the verification call
    pub fn is_verified(&self) -> bool {
        !matches!(self, QuestionMode::MultipleChoice)
    }

    /// Whether a failed verification triggers the widened retry
    pub fn allows_retry(&self) -> bool {
        matches!(self, QuestionMode::Normal)
    }
}

impl fmt::Display for QuestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionMode::Normal => write!(f, "normal"),
            QuestionMode::MultipleChoice => write!(f, "multiple-choice"),
            QuestionMode::AnswerCheck => write!(f, "answer-check"),
        }
    }
}

/// Split a raw line into its mode and the stripped question text.
///
/// The input is trimmed first, then the prefix is matched
/// case-insensitively. Empty text, before or after stripping, is rejected.
pub fn parse_input(raw: &str) -> Result<(QuestionMode, String)> {
    let line = raw.trim();
    let (mode, rest) = match line.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("m:") => (QuestionMode::MultipleChoice, &line[2..]),
        Some("a:") => (QuestionMode::AnswerCheck, &line[2..]),
        _ => (QuestionMode::Normal, line),
    };

    let text = rest.trim();
    if text.is_empty() {
        return Err(TutorError::EmptyQuestion);
    }
    Ok((mode, text.to_string()))
}
