//! Syllabus and follow-up gates for NORMAL questions

use tracing::info;

use crate::errors::Result;
use crate::oracle::{ChatMessage, YesNoClassifier};
use crate::query::mode::{parse_input, QuestionMode};
use crate::query::{GateResults, Query};
use crate::session::Session;
use crate::settings::CourseProfile;

pub struct QueryClassifier {
    gate: YesNoClassifier,
    profile: CourseProfile,
}

impl QueryClassifier {
    pub fn new(gate: YesNoClassifier, profile: CourseProfile) -> Self {
        Self { gate, profile }
    }

    /// Parse the mode prefix and, for NORMAL questions, run the gates.
    ///
    /// A positive follow-up check replaces any syllabus rewrite; the
    /// follow-up rewrite is built from the stripped question.
    pub async fn classify(&self, raw: &str, session: &Session) -> Result<Query> {
        let (mode, text) = parse_input(raw)?;
        let mut rewritten_text = text.clone();
        let mut gates = GateResults::default();

        if mode == QuestionMode::Normal {
            let syllabus = self.gate.classify(&self.syllabus_messages(&text)).await?;
            gates.syllabus = Some(syllabus);
            if syllabus {
                info!("Detected syllabus-related question");
                rewritten_text = syllabus_rewrite(&self.profile.class_name, &text);
            }

            if let Some(previous) = session.last_context() {
                let follow_up = self
                    .gate
                    .classify(&follow_up_messages(&text, previous))
                    .await?;
                gates.follow_up = Some(follow_up);
                if follow_up {
                    info!("Detected follow-up question");
                    rewritten_text = follow_up_rewrite(previous, &text);
                }
            }
        }

        Ok(Query {
            raw_text: raw.to_string(),
            mode,
            text,
            rewritten_text,
            gates,
        })
    }

    fn syllabus_messages(&self, question: &str) -> Vec<ChatMessage> {
        let p = &self.profile;
        vec![ChatMessage::user(format!(
            "This question is from a student in an {} taught by {} with the help of {}. \
             The class is {}. I want to know whether this question is likely about logistical \
             details, schedule, nature, teachers, assignments, or the syllabus of the course? \
             Answer Yes or No and nothing else: {}",
            p.class_name, p.professor, p.assistants, p.class_description, question
        ))]
    }
}

fn follow_up_messages(question: &str, previous: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(format!(
        "Consider this new question: {}. The previous question and response was: {}. \
         Would it be helpful to include the previous context to answer the new question? \
         Answer Yes or No.",
        question, previous
    ))]
}

fn syllabus_rewrite(class_name: &str, question: &str) -> String {
    format!(
        "I may be asking about a detail on the syllabus for {}. {}",
        class_name, question
    )
}

fn follow_up_rewrite(previous: &str, question: &str) -> String {
    format!(
        "I have a follow-up on the previous question and response. {} My new question is: {}",
        previous, question
    )
}
