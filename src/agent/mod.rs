//! Answer generation
//!
//! - `state`: the verification loop state machine
//! - `verifier`: verification calls and the loop driving them
//! - `engine`: whole turns, from raw input to next session

pub mod engine;
pub mod state;
pub mod verifier;

pub use engine::{TurnOutcome, TutorEngine};
pub use state::{LoopEvent, LoopState};
pub use verifier::{Answer, AnswerVerifier, Verification, VerificationLoop, FALLBACK_REPLY};
