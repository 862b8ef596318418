//! Answer verification and the bounded retry loop

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::agent::state::{LoopEvent, LoopState};
use crate::errors::Result;
use crate::oracle::{ChatMessage, CompletionOptions, Oracle, YesNoClassifier};
use crate::query::Query;
use crate::rag::{Prompt, PromptBuilder, RetrievalOrchestrator};
use crate::telemetry::{CallPurpose, TelemetryCollector, TelemetryEvent};

/// Reply returned when neither attempt passes verification
pub const FALLBACK_REPLY: &str =
    "I'm sorry but I cannot answer that question. Can you rephrase or ask an alternative?";

const VERIFICATION_SYSTEM: &str = "Just say 'Yes' or 'No'. Do not give any other answer.";

/// How the final reply fared against the verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Unverified,
    /// Multiple-choice replies are never judged
    NotApplicable,
}

/// Final reply of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub verification: Verification,
    /// Answer calls made (1 or 2)
    pub attempts: u8,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        self.text == FALLBACK_REPLY
    }
}

/// Asks the oracle whether a reply answers the question
#[derive(Clone)]
pub struct AnswerVerifier {
    gate: YesNoClassifier,
}

impl AnswerVerifier {
    pub fn new(gate: YesNoClassifier) -> Self {
        Self { gate }
    }

    pub async fn verify(&self, question: &str, answer: &str) -> Result<bool> {
        self.gate.classify(&verification_messages(question, answer)).await
    }
}

pub fn verification_messages(question: &str, answer: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(VERIFICATION_SYSTEM),
        ChatMessage::user(format!(
            "User: {}\nAttendant: {}\nWas the Attendant able to answer the user's question?",
            question, answer
        )),
    ]
}

/// Drives one answer through [`LoopState`]
pub struct VerificationLoop {
    oracle: Arc<dyn Oracle>,
    verifier: AnswerVerifier,
    retrieval: Arc<RetrievalOrchestrator>,
    prompts: Arc<PromptBuilder>,
    retry_top_k: usize,
    telemetry: TelemetryCollector,
}

impl VerificationLoop {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        retrieval: Arc<RetrievalOrchestrator>,
        prompts: Arc<PromptBuilder>,
        retry_top_k: usize,
        telemetry: TelemetryCollector,
    ) -> Self {
        Self {
            verifier: AnswerVerifier::new(YesNoClassifier::new(oracle.clone())),
            oracle,
            retrieval,
            prompts,
            retry_top_k,
            telemetry,
        }
    }

    /// Answer `query` from `context`, verifying and retrying per its mode.
    ///
    /// Verification and the widened retrieval use the working question.
    pub async fn run(&self, query: &Query, context: &str) -> Result<Answer> {
        let mode = query.mode;
        let question = query.rewritten_text.as_str();

        let mut state = LoopState::Attempt1;
        let mut reply = String::new();
        let mut attempts = 0u8;
        let mut verification = Verification::NotApplicable;

        loop {
            state = match state {
                LoopState::Attempt1 => {
                    let prompt = self.prompts.build(mode, question, context);
                    reply = self.complete(&prompt).await?;
                    attempts += 1;
                    if mode.is_verified() {
                        self.step(state, LoopEvent::ReplyReceived)?
                    } else {
                        self.step(state, LoopEvent::VerificationSkipped)?
                    }
                }
                LoopState::VerifyReply => {
                    let verified = self.verify(question, &reply).await?;
                    info!("Answer verification: {}", if verified { "Yes" } else { "No" });
                    if verified {
                        verification = Verification::Verified;
                        self.step(state, LoopEvent::VerificationPassed)?
                    } else if mode.allows_retry() {
                        self.step(state, LoopEvent::VerificationFailed)?
                    } else {
                        verification = Verification::Unverified;
                        self.step(state, LoopEvent::RetryDisallowed)?
                    }
                }
                LoopState::Attempt2Retry => {
                    info!("Attempting follow-up query with alternate context");
                    self.telemetry.record(TelemetryEvent::VerificationRetry {
                        timestamp: Instant::now(),
                    });

                    let widened = self
                        .retrieval
                        .retrieve_widened(question, context, self.retry_top_k)
                        .await?;
                    self.telemetry.record(TelemetryEvent::Retrieval {
                        k: self.retry_top_k,
                        chunks: widened.chunk_count,
                        timestamp: Instant::now(),
                    });

                    let prompt = self.prompts.build(mode, question, &widened.text);
                    reply = self.complete(&prompt).await?;
                    attempts += 1;
                    self.step(state, LoopEvent::ReplyReceived)?
                }
                LoopState::VerifyRetry => {
                    let verified = self.verify(question, &reply).await?;
                    info!("Retry verification: {}", if verified { "Yes" } else { "No" });
                    if verified {
                        verification = Verification::Verified;
                        self.step(state, LoopEvent::VerificationPassed)?
                    } else {
                        verification = Verification::Unverified;
                        self.step(state, LoopEvent::VerificationFailed)?
                    }
                }
                LoopState::Accepted => {
                    return Ok(Answer {
                        text: reply,
                        verification,
                        attempts,
                    });
                }
                LoopState::Fallback => {
                    self.telemetry.record(TelemetryEvent::Fallback {
                        timestamp: Instant::now(),
                    });
                    return Ok(Answer {
                        text: FALLBACK_REPLY.to_string(),
                        verification,
                        attempts,
                    });
                }
            };
        }
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.telemetry.oracle_calls(CallPurpose::Answer, 1);
        debug!(oracle = self.oracle.name(), "Requesting answer");
        self.oracle
            .complete(&prompt.messages(), &CompletionOptions::default())
            .await
    }

    async fn verify(&self, question: &str, reply: &str) -> Result<bool> {
        self.telemetry.oracle_calls(CallPurpose::Verification, 1);
        self.verifier.verify(question, reply).await
    }

    fn step(&self, state: LoopState, event: LoopEvent) -> Result<LoopState> {
        let next = state.transition(event)?;
        debug!(from = ?state, to = ?next, "Verification loop transition");
        self.telemetry.record(TelemetryEvent::StateTransition {
            from: format!("{:?}", state),
            to: format!("{:?}", next),
            timestamp: Instant::now(),
        });
        Ok(next)
    }
}
