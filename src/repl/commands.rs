//! REPL built-in commands

use colored::*;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Reset,
    Stats,
    Context,
    Exit,
    Unknown { input: String },
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

/// Parse input string into a command
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    let name = trimmed
        .strip_prefix('/')
        .and_then(|rest| rest.split_whitespace().next())
        .map(str::to_lowercase);

    match name.as_deref() {
        Some("help") | Some("h") => Command::Help,
        Some("reset") => Command::Reset,
        Some("stats") | Some("status") => Command::Stats,
        Some("context") | Some("ctx") => Command::Context,
        Some("exit") | Some("quit") | Some("q") => Command::Exit,
        _ => Command::Unknown {
            input: input.to_string(),
        },
    }
}

/// Display help information
pub fn show_help() {
    println!("\n{}", "Available Commands:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let commands = [
        ("/help, /h", "Show this help message"),
        ("/reset", "Forget the remembered course context"),
        ("/stats", "Show oracle calls, retries and fallbacks"),
        ("/context, /ctx", "Show the remembered course context"),
        ("/exit, /quit, /q", "Exit REPL"),
    ];

    for (cmd, desc) in commands {
        println!("  {:<20} {}", cmd.green(), desc);
    }

    println!("\n{}", "Usage:".bold());
    println!("  - Type a question directly (no / prefix)");
    println!("  - Prefix with {} for a multiple-choice question on a topic", "m:".cyan());
    println!("  - Prefix with {} to check your answer to the last one", "a:".cyan());
    println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command("  /exit"));
        assert!(!is_command("m: what is /dev/null"));
        assert!(!is_command("When is the midterm?"));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/H"), Command::Help);
        assert_eq!(parse("/reset"), Command::Reset);
        assert_eq!(parse("/stats"), Command::Stats);
        assert_eq!(parse("/ctx"), Command::Context);
        assert_eq!(parse("/quit"), Command::Exit);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse("/frobnicate"),
            Command::Unknown {
                input: "/frobnicate".to_string()
            }
        );
        assert!(matches!(parse("/"), Command::Unknown { .. }));
    }
}
