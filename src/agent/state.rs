//! Verification loop state machine
//!
//! A bounded two-attempt protocol:
//! - Safety: at most two answer calls and two verification calls
//! - Liveness: every path ends in `Accepted` or `Fallback`
//! - Determinism: unique next state per event

use crate::errors::{Result, TutorError};
use serde::{Deserialize, Serialize};

/// Verification loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopState {
    /// Primary completion with the first context
    Attempt1,

    /// Judging the primary reply
    VerifyReply,

    /// Completion with the widened context
    Attempt2Retry,

    /// Judging the retry reply
    VerifyRetry,

    /// Canned reply returned (terminal)
    Fallback,

    /// A reply was accepted (terminal)
    Accepted,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// The oracle produced a reply
    ReplyReceived,

    /// The mode is not verified
    VerificationSkipped,

    /// The verifier said yes
    VerificationPassed,

    /// The verifier said no
    VerificationFailed,

    /// The verifier said no but the mode forbids a retry
    RetryDisallowed,
}

impl LoopState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Fallback | LoopState::Accepted)
    }

    /// Attempt state transition with validation
    ///
    /// Valid transitions:
    /// 1. Attempt1      → VerifyReply   (on: ReplyReceived)
    /// 2. Attempt1      → Accepted      (on: VerificationSkipped)
    /// 3. VerifyReply   → Accepted      (on: VerificationPassed | RetryDisallowed)
    /// 4. VerifyReply   → Attempt2Retry (on: VerificationFailed)
    /// 5. Attempt2Retry → VerifyRetry   (on: ReplyReceived)
    /// 6. VerifyRetry   → Accepted      (on: VerificationPassed)
    /// 7. VerifyRetry   → Fallback      (on: VerificationFailed)
    ///
    /// Terminal states accept no events.
    pub fn transition(&self, event: LoopEvent) -> Result<LoopState> {
        use LoopEvent::*;
        use LoopState::*;

        let next_state = match (self, event) {
            (Attempt1, ReplyReceived) => VerifyReply,
            (Attempt1, VerificationSkipped) => Accepted,

            (VerifyReply, VerificationPassed) => Accepted,
            (VerifyReply, RetryDisallowed) => Accepted,
            (VerifyReply, VerificationFailed) => Attempt2Retry,

            (Attempt2Retry, ReplyReceived) => VerifyRetry,

            (VerifyRetry, VerificationPassed) => Accepted,
            (VerifyRetry, VerificationFailed) => Fallback,

            (from, event) => {
                return Err(TutorError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next_state)
    }

    /// Get all valid events from this state
    pub fn valid_events(&self) -> Vec<LoopEvent> {
        use LoopEvent::*;
        use LoopState::*;

        match self {
            Attempt1 => vec![ReplyReceived, VerificationSkipped],
            VerifyReply => vec![VerificationPassed, VerificationFailed, RetryDisallowed],
            Attempt2Retry => vec![ReplyReceived],
            VerifyRetry => vec![VerificationPassed, VerificationFailed],
            Fallback | Accepted => vec![],
        }
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoopState::Attempt1 => "Answering",
            LoopState::VerifyReply => "Verifying answer",
            LoopState::Attempt2Retry => "Retrying with wider context",
            LoopState::VerifyRetry => "Verifying retry",
            LoopState::Fallback => "Fallback",
            LoopState::Accepted => "Accepted",
        }
    }
}
