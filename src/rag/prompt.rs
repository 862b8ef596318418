//! Mode-specific prompt assembly
//!
//! Pure functions of mode, course profile, question and context. The
//! context is inserted as-is under a `Context:` header.

use crate::oracle::ChatMessage;
use crate::query::QuestionMode;
use crate::settings::CourseProfile;

/// Header placed between the instructions and the context block
pub const CONTEXT_HEADER: &str = "\n\nContext:\n";

/// System and user message for one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    profile: CourseProfile,
}

impl PromptBuilder {
    pub fn new(profile: CourseProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &CourseProfile {
        &self.profile
    }

    /// Persona and task instructions for `mode`
    pub fn instructions(&self, mode: QuestionMode) -> String {
        let class_name = &self.profile.class_name;
        let mut text = match mode {
            QuestionMode::MultipleChoice => format!(
                "You are a very truthful, precise TA in a {}. You think step by step. \
                 A strong graduate student is using you as a tutor. The student would like you \
                 to prepare a challenging multiple choice question on the requested topic drawing \
                 ONLY on the attached context. Do not refer to 'the attached context' explicitly. \
                 Present the question followed by options A to D. After the question, write \
                 <span style='display:none'> then give your answer and a short explanation, then \
                 close the span with </span>.",
                class_name
            ),
            QuestionMode::AnswerCheck => format!(
                "You are a very truthful, precise TA in a {}. You think step by step. \
                 You are testing a strong graduate student on their knowledge. Using the attached \
                 context, tell me whether the attached multiple choice answer is correct. Draw ONLY \
                 on the context for definitions and theoretical content. Do not refer to 'the \
                 attached context'. Just state your answer and rationale.",
                class_name
            ),
            QuestionMode::Normal => format!(
                "You are a very truthful, precise TA in a {}, a {}. You think step by step. \
                 A strong graduate student is asking you questions. Answer in no more than three \
                 paragraphs if the answer is found in the attached context. Do not restate the \
                 question or refer explicitly to the context. If you cannot find the answer in \
                 the context, say 'I don't know'.",
                class_name, self.profile.class_description
            ),
        };

        let extra = self.profile.instructions.trim();
        if !extra.is_empty() {
            text.push(' ');
            text.push_str(extra);
        }
        text
    }

    /// User message sent for `question`
    pub fn user_message(&self, mode: QuestionMode, question: &str) -> String {
        match mode {
            QuestionMode::MultipleChoice => format!(
                "Construct a challenging multiple-choice question to test me on a concept related to {}",
                question
            ),
            QuestionMode::Normal | QuestionMode::AnswerCheck => question.to_string(),
        }
    }

    pub fn build(&self, mode: QuestionMode, question: &str, context: &str) -> Prompt {
        Prompt {
            system: format!("{}{}{}", self.instructions(mode), CONTEXT_HEADER, context),
            user: self.user_message(mode, question),
        }
    }
}
