//! Yes/no classification through the oracle
//!
//! Every gate in the engine (syllabus, follow-up, verification) asks the
//! oracle a yes/no question and reads the reply with [`is_affirmative`].

use std::sync::Arc;

use crate::errors::Result;
use crate::oracle::types::{ChatMessage, CompletionOptions};
use crate::oracle::Oracle;

/// A reply means yes iff its trimmed, lowercased text starts with `y`.
///
/// Anything else, including empty or malformed replies, is a no.
pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase().starts_with('y')
}

/// Boolean-producing oracle gate
#[derive(Clone)]
pub struct YesNoClassifier {
    oracle: Arc<dyn Oracle>,
}

impl YesNoClassifier {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Ask a templated yes/no question
    pub async fn classify(&self, messages: &[ChatMessage]) -> Result<bool> {
        let reply = self
            .oracle
            .complete(messages, &CompletionOptions::classification())
            .await?;
        Ok(is_affirmative(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quickcheck_macros::quickcheck;
    use std::sync::Mutex;

    #[test]
    fn test_affirmative_replies() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative("  yes."));
        assert!(is_affirmative("Y"));
        assert!(is_affirmative("\nYES, it is"));
        // Only the first letter matters.
        assert!(is_affirmative("Yellow"));
    }

    #[test]
    fn test_everything_else_is_no() {
        assert!(!is_affirmative("No"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("   "));
        assert!(!is_affirmative("Maybe yes"));
        assert!(!is_affirmative("**Yes**"));
    }

    #[quickcheck]
    fn prop_prefix_rule(reply: String) -> bool {
        is_affirmative(&reply) == reply.trim().to_lowercase().starts_with('y')
    }

    struct RecordingOracle {
        reply: String,
        seen: Mutex<Vec<CompletionOptions>>,
    }

    #[async_trait]
    impl Oracle for RecordingOracle {
        async fn complete(&self, _: &[ChatMessage], options: &CompletionOptions) -> Result<String> {
            self.seen.lock().unwrap().push(*options);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_classify_uses_short_deterministic_options() {
        let oracle = Arc::new(RecordingOracle {
            reply: "Yes".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let classifier = YesNoClassifier::new(oracle.clone());

        assert!(classifier.classify(&[ChatMessage::user("Is it?")]).await.unwrap());
        assert_eq!(
            oracle.seen.lock().unwrap().as_slice(),
            &[CompletionOptions::classification()]
        );
    }

    #[tokio::test]
    async fn test_classify_collapses_malformed_reply_to_no() {
        let oracle = Arc::new(RecordingOracle {
            reply: "I am not sure.".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let classifier = YesNoClassifier::new(oracle);
        assert!(!classifier.classify(&[ChatMessage::user("Is it?")]).await.unwrap());
    }
}
