//! Interactive REPL
//!
//! One conversation per REPL run, kept in a [`SessionStore`] under a
//! fresh [`ConversationId`]. Lines starting with `/` are commands;
//! everything else is a question turn.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::agent::TutorEngine;
use crate::repl::commands::{is_command, Command};
pub use crate::repl::display::{final_answer_block, DisplayManager, FINAL_ANSWER_MARKER};
use crate::repl::input::{InputHandler, InputLine};
use crate::session::{ConversationId, SessionStore};

/// History file name under the home directory
pub const HISTORY_FILE: &str = ".coursebuddy_history";

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    display: DisplayManager,
    store: SessionStore,
    conversation: ConversationId,
}

impl ReplSession {
    pub fn new(show_progress: bool) -> Result<Self> {
        Self::build(InputHandler::new()?, show_progress)
    }

    /// Create REPL session with persistent history
    pub fn with_history(history_path: PathBuf, show_progress: bool) -> Result<Self> {
        Self::build(InputHandler::with_history(history_path)?, show_progress)
    }

    fn build(input_handler: InputHandler, show_progress: bool) -> Result<Self> {
        Ok(ReplSession {
            input_handler,
            display: DisplayManager::new(show_progress),
            store: SessionStore::new(),
            conversation: ConversationId::new(),
        })
    }

    /// Default history path (`~/.coursebuddy_history`)
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE))
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display
    }

    pub fn conversation(&self) -> ConversationId {
        self.conversation
    }

    /// Read-eval-print until `/exit` or EOF
    pub async fn run(&mut self, engine: &TutorEngine, model: &str) -> Result<()> {
        self.display
            .show_banner(env!("CARGO_PKG_VERSION"), engine.profile(), model);

        loop {
            let line = match self.input_handler.read_line() {
                Ok(InputLine::Text(line)) => line,
                Ok(InputLine::EndOfInput) => break,
                Err(e) => {
                    self.display.show_warning(&e.to_string());
                    break;
                }
            };

            if !self.handle_input(engine, &line).await? {
                break;
            }
        }

        self.input_handler.save_history()?;
        Ok(())
    }

    /// Handle one line; returns false when the REPL should exit
    pub async fn handle_input(&mut self, engine: &TutorEngine, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            return self.execute(engine, commands::parse(input)).await;
        }

        let spinner = self.display.start_thinking();
        let result = engine.answer_in(&self.store, self.conversation, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => self.display.show_answer(&answer),
            Err(e) => self.display.show_error(&e.to_string()),
        }
        Ok(true)
    }

    async fn execute(&mut self, engine: &TutorEngine, command: Command) -> Result<bool> {
        match command {
            Command::Help => commands::show_help(),
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return Ok(false);
            }
            Command::Reset => {
                self.store.reset(self.conversation).await;
                self.display.show_info("Conversation reset. Context cleared.");
            }
            Command::Stats => {
                self.display.show_section("Session Statistics:");
                println!("{}\n", engine.telemetry().summary());
            }
            Command::Context => {
                let session = self.store.get(self.conversation).await;
                match (session.last_context(), session.updated_at()) {
                    (Some(context), Some(updated)) => {
                        self.display
                            .show_section(&format!("Remembered context (updated {}):", updated.format("%H:%M:%S")));
                        println!("{}\n", context);
                    }
                    _ => self.display.show_info("No context remembered yet."),
                }
            }
            Command::Unknown { input } => {
                self.display
                    .show_warning(&format!("Unknown command: {} (type /help)", input));
            }
        }
        Ok(true)
    }
}
