//! Question parsing and classification
//!
//! A raw input line becomes a [`Query`]: the mode is read once from the
//! two-character prefix, and NORMAL questions may then be rewritten by
//! the syllabus and follow-up gates.

pub mod classifier;
pub mod mode;

pub use classifier::QueryClassifier;
pub use mode::{parse_input, QuestionMode};

/// Outcome of the classification gates; `None` means the gate did not run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateResults {
    pub syllabus: Option<bool>,
    pub follow_up: Option<bool>,
}

impl GateResults {
    /// Number of oracle calls the gates made
    pub fn oracle_calls(&self) -> usize {
        self.syllabus.is_some() as usize + self.follow_up.is_some() as usize
    }
}

/// A classified question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Input exactly as received
    pub raw_text: String,
    pub mode: QuestionMode,
    /// Text after prefix stripping and trimming
    pub text: String,
    /// Working question used for retrieval, prompting and verification
    pub rewritten_text: String,
    pub gates: GateResults,
}

impl Query {
    pub fn was_rewritten(&self) -> bool {
        self.rewritten_text != self.text
    }
}
