//! Terminal output for the REPL and one-shot mode

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::agent::{Answer, Verification};
use crate::settings::CourseProfile;

/// Marker line preceding every reply on stdout
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Reply block as printed on stdout: the marker line, then the reply
pub fn final_answer_block(reply: &str) -> String {
    format!("{}\n{}", FINAL_ANSWER_MARKER, reply)
}

/// Display manager for REPL UI
pub struct DisplayManager {
    update_interval: Duration,
    show_progress: bool,
}

impl DisplayManager {
    pub fn new(show_progress: bool) -> Self {
        DisplayManager {
            update_interval: Duration::from_millis(100),
            show_progress,
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, profile: &CourseProfile, model: &str) {
        let width = 64;
        let rule = "=".repeat(width);
        let title = format!("  {} {} - {}", profile.assistant_name, version, profile.class_name);
        let info = format!("  Professor: {} | Model: {}", profile.professor, model);

        println!("\n{}", rule.cyan());
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "Ask a question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner shown while a turn runs; hidden when progress is off
    pub fn start_thinking(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Consulting course materials...");
        pb.enable_steady_tick(self.update_interval);
        pb
    }

    /// Print a reply with its verification status
    pub fn show_answer(&self, answer: &Answer) {
        println!("\n{}", final_answer_block(&answer.text));

        let status = match answer.verification {
            Verification::Verified => "verified".green(),
            Verification::Unverified => "unverified".yellow(),
            Verification::NotApplicable => "not verified (quiz)".dimmed(),
        };
        println!("{}\n", format!("[{} | attempts: {}]", status, answer.attempts).dimmed());
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "=".repeat(60).cyan());
    }
}
