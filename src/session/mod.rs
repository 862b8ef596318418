//! Conversation sessions
//!
//! A [`Session`] remembers the most recent retrieved context of one
//! conversation. Turns take a session and hand back its successor;
//! [`SessionStore`] keeps many conversations apart by [`ConversationId`].

pub mod store;

pub use store::{ConversationId, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context memory of one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    last_context: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Session holding `context`, truncated to `max_chars` characters
    pub fn with_context(context: &str, max_chars: usize) -> Self {
        let mut session = Self::new();
        session.remember(context, max_chars);
        session
    }

    /// Replace the remembered context with the first `max_chars` characters of `context`
    pub fn remember(&mut self, context: &str, max_chars: usize) {
        self.last_context = Some(context.chars().take(max_chars).collect());
        self.updated_at = Some(Utc::now());
    }

    /// Remembered context; an empty string counts as none
    pub fn last_context(&self) -> Option<&str> {
        self.last_context.as_deref().filter(|c| !c.is_empty())
    }

    pub fn has_context(&self) -> bool {
        self.last_context().is_some()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn clear(&mut self) {
        self.last_context = None;
        self.updated_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(!session.has_context());
        assert!(session.updated_at().is_none());
    }

    #[test]
    fn test_remember_truncates_by_characters() {
        let context = "é".repeat(4000);
        let session = Session::with_context(&context, 3900);

        let stored = session.last_context().unwrap();
        assert_eq!(stored.chars().count(), 3900);
        assert!(context.starts_with(stored));
        assert!(session.updated_at().is_some());
    }

    #[test]
    fn test_short_context_kept_whole() {
        let session = Session::with_context("Midterm is in week 7.", 3900);
        assert_eq!(session.last_context(), Some("Midterm is in week 7."));
    }

    #[test]
    fn test_empty_context_counts_as_absent() {
        let session = Session::with_context("", 3900);
        assert!(!session.has_context());
    }

    #[test]
    fn test_remember_overwrites() {
        let mut session = Session::with_context("first", 3900);
        session.remember("second", 3900);
        assert_eq!(session.last_context(), Some("second"));

        session.clear();
        assert!(session.last_context().is_none());
    }
}
