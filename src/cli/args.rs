//! Command-line arguments for CourseBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, OracleBackend};

/// CourseBuddy - course teaching assistant over indexed course materials
#[derive(Parser, Debug)]
#[command(name = "coursebuddy")]
#[command(version)]
#[command(about = "Answer course questions from indexed course materials", long_about = None)]
pub struct Args {
    /// Question to answer (prefix `m:` for a quiz question, `a:` to check an answer).
    /// Read from stdin when omitted.
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the index and metadata files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Course settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Language model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Language-model backend (openai or ollama)
    #[arg(long)]
    pub oracle: Option<OracleBackend>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only the answer is printed)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start interactive REPL mode
    Start,

    /// Display current configuration and course profile
    Config,

    /// Check that the index, metadata and settings load
    Doctor,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// A question and a subcommand are mutually exclusive
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.data.dir = dir.clone();
        }
        if let Some(settings) = &self.settings {
            config.data.settings_file = settings.clone();
        }
        if let Some(model) = &self.model {
            config.oracle.model = model.clone();
        }
        if let Some(backend) = self.oracle {
            config.oracle.backend = backend;
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "coursebuddy=info,warn",
            Verbosity::VeryVerbose => "coursebuddy=debug,info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["coursebuddy", "-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["coursebuddy"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["coursebuddy", "-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["coursebuddy", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_question_positional() {
        let args = parse(&["coursebuddy", "m: explain gradient descent"]);
        assert_eq!(args.question.as_deref(), Some("m: explain gradient descent"));
        assert!(args.command.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(parse(&["coursebuddy", "start"]).command, Some(Commands::Start));
        assert_eq!(parse(&["coursebuddy", "doctor"]).command, Some(Commands::Doctor));
        assert_eq!(parse(&["coursebuddy", "config"]).command, Some(Commands::Config));
    }

    #[test]
    fn test_validate_fail_both_question_and_command() {
        let mut args = parse(&["coursebuddy", "doctor"]);
        args.question = Some("When is the midterm?".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "coursebuddy",
            "--data-dir",
            "/srv/ml601",
            "--settings",
            "/srv/ml601/settings.txt",
            "--model",
            "llama3.1:8b",
            "--oracle",
            "ollama",
        ]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.data.dir, PathBuf::from("/srv/ml601"));
        assert_eq!(config.data.settings_file, PathBuf::from("/srv/ml601/settings.txt"));
        assert_eq!(config.oracle.model, "llama3.1:8b");
        assert_eq!(config.oracle.backend, OracleBackend::Ollama);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(Args::try_parse_from(["coursebuddy", "--oracle", "claude"]).is_err());
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
        assert_eq!(Verbosity::Verbose.log_filter(), "coursebuddy=info,warn");
    }
}
