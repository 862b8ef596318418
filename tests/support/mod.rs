//! Scripted collaborators for turn-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use coursebuddy::config::RetrievalConfig;
use coursebuddy::embedding::Embedder;
use coursebuddy::index::{ChunkMetadata, CourseIndex, FlatL2Index};
use coursebuddy::oracle::{ChatMessage, CompletionOptions, Oracle, Role};
use coursebuddy::settings::CourseProfile;
use coursebuddy::{agent::TutorEngine, Result, TutorError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const MIDTERM: &str = "The midterm exam is held in week 7.";
pub const GRADIENT: &str = "Gradient descent follows the negative gradient of the loss.";
pub const OFFICE_HOURS: &str = "Office hours are Tuesdays at 3pm.";
pub const LATE_POLICY: &str = "Late homework loses 10% per day; the midterm cannot be retaken.";
pub const GRADING: &str = "Grades: homework 40%, midterm 25%, final 35%.";

/// Kind of oracle call, told apart by the prompt it carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Syllabus,
    FollowUp,
    Verification,
    Answer,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub messages: Vec<ChatMessage>,
    pub options: CompletionOptions,
}

impl RecordedCall {
    pub fn system(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    pub fn user(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Oracle answering each call kind from its own reply queue.
///
/// Gates default to "No", verification to "Yes" and answers to a
/// numbered placeholder once their queues run dry.
#[derive(Default)]
pub struct ScriptedOracle {
    syllabus: Mutex<VecDeque<String>>,
    follow_up: Mutex<VecDeque<String>>,
    verification: Mutex<VecDeque<String>>,
    answers: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    fail_answers: bool,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every answer call fails with an API error
    pub fn failing_answers() -> Self {
        Self {
            fail_answers: true,
            ..Self::default()
        }
    }

    pub fn syllabus(self, replies: &[&str]) -> Self {
        Self::push(&self.syllabus, replies);
        self
    }

    pub fn follow_up(self, replies: &[&str]) -> Self {
        Self::push(&self.follow_up, replies);
        self
    }

    pub fn verification(self, replies: &[&str]) -> Self {
        Self::push(&self.verification, replies);
        self
    }

    pub fn answers(self, replies: &[&str]) -> Self {
        Self::push(&self.answers, replies);
        self
    }

    fn push(queue: &Mutex<VecDeque<String>>, replies: &[&str]) {
        queue
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| r.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    fn kind_of(messages: &[ChatMessage]) -> CallKind {
        let user = messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        if user.starts_with("This question is from a student") {
            CallKind::Syllabus
        } else if user.starts_with("Consider this new question") {
            CallKind::FollowUp
        } else if system.starts_with("Just say 'Yes' or 'No'") {
            CallKind::Verification
        } else {
            CallKind::Answer
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<String> {
        let kind = Self::kind_of(messages);
        let answer_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                kind,
                messages: messages.to_vec(),
                options: *options,
            });
            calls.iter().filter(|c| c.kind == CallKind::Answer).count()
        };

        let next = |queue: &Mutex<VecDeque<String>>| queue.lock().unwrap().pop_front();
        match kind {
            CallKind::Syllabus => Ok(next(&self.syllabus).unwrap_or_else(|| "No".to_string())),
            CallKind::FollowUp => Ok(next(&self.follow_up).unwrap_or_else(|| "No".to_string())),
            CallKind::Verification => Ok(next(&self.verification).unwrap_or_else(|| "Yes".to_string())),
            CallKind::Answer if self.fail_answers => {
                Err(TutorError::oracle("scripted", "HTTP 400: bad request"))
            }
            CallKind::Answer => {
                Ok(next(&self.answers).unwrap_or_else(|| format!("answer {}", answer_number)))
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Embeds by keyword so that search results are predictable; records every input
#[derive(Default)]
pub struct KeywordEmbedder {
    inputs: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(TutorError::embedding("keyword", "input text is empty"));
        }
        self.inputs.lock().unwrap().push(text.to_string());

        let lower = text.to_lowercase();
        let vector = if lower.contains("midterm") {
            vec![1.0, 0.0, 0.0]
        } else if lower.contains("gradient") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        };
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Index over `(vector, text)` rows, all from `syllabus.pdf`
pub fn index_of(rows: Vec<(Vec<f32>, String)>) -> CourseIndex {
    let (vectors, texts): (Vec<Vec<f32>>, Vec<String>) = rows.into_iter().unzip();
    let metadata = texts
        .into_iter()
        .enumerate()
        .map(|(i, chunk_text)| ChunkMetadata {
            filename: "syllabus.pdf".to_string(),
            chunk_index: i as u32,
            chunk_text,
        })
        .collect();

    CourseIndex::new(Box::new(FlatL2Index::from_vectors(vectors).unwrap()), metadata).unwrap()
}

/// Five chunks of `syllabus.pdf`, one vector per chunk
pub fn course_index() -> CourseIndex {
    let rows = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.9, 0.1, 0.0],
        vec![0.5, 0.5, 0.5],
    ];
    let texts = [MIDTERM, GRADIENT, OFFICE_HOURS, LATE_POLICY, GRADING];
    let metadata = texts
        .iter()
        .enumerate()
        .map(|(i, text)| ChunkMetadata {
            filename: "syllabus.pdf".to_string(),
            chunk_index: i as u32,
            chunk_text: text.to_string(),
        })
        .collect();

    CourseIndex::new(Box::new(FlatL2Index::from_vectors(rows).unwrap()), metadata).unwrap()
}

pub fn profile() -> CourseProfile {
    CourseProfile {
        class_name: "Machine Learning 601".to_string(),
        professor: "Dr. Rivera".to_string(),
        assistants: "Sam and Priya".to_string(),
        class_description: "a graduate survey of statistical learning".to_string(),
        instructions: String::new(),
        assistant_name: "Virtual Assistant".to_string(),
    }
}

/// Engine over the scripted collaborators
pub fn engine(oracle: Arc<ScriptedOracle>, embedder: Arc<KeywordEmbedder>) -> TutorEngine {
    engine_over(oracle, embedder, course_index())
}

pub fn engine_over(
    oracle: Arc<ScriptedOracle>,
    embedder: Arc<KeywordEmbedder>,
    index: CourseIndex,
) -> TutorEngine {
    TutorEngine::new(
        oracle,
        embedder,
        Arc::new(index),
        profile(),
        RetrievalConfig::default(),
    )
}
