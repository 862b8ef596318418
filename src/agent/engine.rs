//! Turn engine
//!
//! One turn: classify → retrieve (or reuse the session context) →
//! prompt → verification loop → next session. Sessions go in and come
//! back out; the engine itself holds no conversation state.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::agent::verifier::{Answer, VerificationLoop};
use crate::config::{Config, RetrievalConfig};
use crate::embedding::{self, Embedder};
use crate::errors::{Result, TutorError};
use crate::index::CourseIndex;
use crate::oracle::{self, Oracle, YesNoClassifier};
use crate::query::{Query, QueryClassifier, QuestionMode};
use crate::rag::{PromptBuilder, RetrievalOrchestrator};
use crate::session::{ConversationId, Session, SessionStore};
use crate::settings::{CourseProfile, Settings};
use crate::telemetry::{CallPurpose, TelemetryCollector, TelemetryEvent};

/// Result of a successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: Answer,
    /// Session to carry into the next turn of this conversation
    pub session: Session,
    pub query: Query,
    /// Context the primary attempt was given
    pub context: String,
}

pub struct TutorEngine {
    classifier: QueryClassifier,
    retrieval: Arc<RetrievalOrchestrator>,
    answer_loop: VerificationLoop,
    prompts: Arc<PromptBuilder>,
    config: RetrievalConfig,
    telemetry: TelemetryCollector,
}

impl TutorEngine {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        embedder: Arc<dyn Embedder>,
        index: Arc<CourseIndex>,
        profile: CourseProfile,
        config: RetrievalConfig,
    ) -> Self {
        let telemetry = TelemetryCollector::new();
        let retrieval = Arc::new(RetrievalOrchestrator::new(embedder, index));
        let prompts = Arc::new(PromptBuilder::new(profile.clone()));
        let answer_loop = VerificationLoop::new(
            oracle.clone(),
            retrieval.clone(),
            prompts.clone(),
            config.retry_top_k,
            telemetry.clone(),
        );

        Self {
            classifier: QueryClassifier::new(YesNoClassifier::new(oracle), profile),
            retrieval,
            answer_loop,
            prompts,
            config,
            telemetry,
        }
    }

    /// Load settings, index and collaborators named by `config`.
    ///
    /// Fails if any data file is missing or the embedder does not match
    /// the index dimension.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = Settings::load(&config.data.settings_file)?;
        let index = CourseIndex::load(&config.data.index_path(), &config.data.metadata_path())?;

        let choice = settings.embedding_choice();
        info!(embedder = %choice.describe(), "Loading query embedder");
        let embedder = embedding::from_settings(
            &choice,
            config.api_key(),
            Duration::from_secs(config.oracle.request_timeout_secs),
        )?;
        if embedder.dimension() != index.dimension() {
            return Err(TutorError::DimensionMismatch {
                expected: index.dimension(),
                actual: embedder.dimension(),
            });
        }

        let oracle = oracle::from_config(config)?;
        Ok(Self::new(
            oracle,
            embedder,
            Arc::new(index),
            settings.course_profile(),
            config.retrieval.clone(),
        ))
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn profile(&self) -> &CourseProfile {
        self.prompts.profile()
    }

    pub fn index(&self) -> &CourseIndex {
        self.retrieval.index()
    }

    /// Run one turn against `session`.
    ///
    /// On error the caller's session is left as it was.
    pub async fn answer(&self, raw: &str, session: &Session) -> Result<TurnOutcome> {
        let started = Instant::now();
        match self.run_turn(raw, session).await {
            Ok(outcome) => {
                self.telemetry.record(TelemetryEvent::TurnCompleted {
                    mode: outcome.query.mode,
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Instant::now(),
                });
                Ok(outcome)
            }
            Err(e) => {
                self.telemetry.record(TelemetryEvent::TurnFailed {
                    error: e.to_string(),
                    timestamp: Instant::now(),
                });
                Err(e)
            }
        }
    }

    /// Run one turn for a stored conversation and save its next session
    pub async fn answer_in(
        &self,
        store: &SessionStore,
        id: ConversationId,
        raw: &str,
    ) -> Result<Answer> {
        let session = store.get(id).await;
        let outcome = self.answer(raw, &session).await?;
        store.put(id, outcome.session).await;
        Ok(outcome.answer)
    }

    async fn run_turn(&self, raw: &str, session: &Session) -> Result<TurnOutcome> {
        let query = self.classifier.classify(raw, session).await?;
        self.telemetry
            .oracle_calls(CallPurpose::Classification, query.gates.oracle_calls());
        info!(mode = %query.mode, rewritten = query.was_rewritten(), "Question classified");

        let context = match query.mode {
            QuestionMode::AnswerCheck => match session.last_context() {
                Some(previous) => previous.to_string(),
                None => {
                    warn!("No previous session context available for answer check");
                    String::new()
                }
            },
            QuestionMode::Normal | QuestionMode::MultipleChoice => {
                let retrieved = self
                    .retrieval
                    .retrieve(&query.rewritten_text, self.config.top_k)
                    .await?;
                self.telemetry.record(TelemetryEvent::Retrieval {
                    k: self.config.top_k,
                    chunks: retrieved.chunk_count,
                    timestamp: Instant::now(),
                });
                info!(chunks = retrieved.chunk_count, "Retrieved relevant context from course materials");
                retrieved.text
            }
        };

        let answer = self.answer_loop.run(&query, &context).await?;

        let mut next = session.clone();
        if query.mode.updates_session() {
            next.remember(&context, self.config.session_max_chars);
        }

        Ok(TurnOutcome {
            answer,
            session: next,
            query,
            context,
        })
    }
}
