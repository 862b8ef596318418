//! Line input for the REPL (rustyline)

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::repl::commands::is_command;

/// Prompt shown before every question
pub const QUESTION_PROMPT: &str = "Enter your prompt: ";

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Trimmed text; may be empty
    Text(String),
    /// Ctrl-D
    EndOfInput,
}

pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            history_path: None,
        })
    }

    /// Editor whose question history is loaded from and saved to `history_file`
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut handler = Self::new()?;
        if history_file.exists() {
            // A corrupt history file only costs the old entries.
            let _ = handler.editor.load_history(&history_file);
        }
        handler.history_path = Some(history_file);
        Ok(handler)
    }

    /// Read one line; Ctrl-C is reported as an error
    pub fn read_line(&mut self) -> Result<InputLine> {
        match self.editor.readline(QUESTION_PROMPT) {
            Ok(line) => {
                let line = line.trim().to_string();
                self.remember(&line);
                Ok(InputLine::Text(line))
            }
            Err(ReadlineError::Eof) => Ok(InputLine::EndOfInput),
            Err(ReadlineError::Interrupted) => Err(anyhow::anyhow!("Interrupted")),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Keep questions in history; REPL commands and blank lines are skipped
    fn remember(&mut self, line: &str) -> bool {
        if line.is_empty() || is_command(line) {
            return false;
        }
        self.editor.add_history_entry(line).unwrap_or(false)
    }

    pub fn save_history(&mut self) -> Result<()> {
        if let Some(path) = &self.history_path {
            self.editor.save_history(path)?;
        }
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}
