//! CourseBuddy - main CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use coursebuddy::{
    agent::TutorEngine,
    cli::{Args, Commands},
    config::Config,
    doctor::Doctor,
    repl::{final_answer_block, ReplSession},
    session::Session,
    settings::Settings,
};
use std::io::BufRead;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        anyhow::bail!(message);
    }

    let verbosity = args.verbosity();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    match &args.command {
        Some(Commands::Start) => run_repl(&config, verbosity.show_progress()).await?,
        Some(Commands::Config) => show_config(&config)?,
        Some(Commands::Doctor) => run_doctor(config).await,
        None => {
            let question = match &args.question {
                Some(question) => question.clone(),
                None => read_question()?,
            };
            run_question(&config, &question).await?;
        }
    }

    Ok(())
}

/// One line from stdin, as in a piped invocation
fn read_question() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read question from stdin")?;
    Ok(line)
}

async fn run_question(config: &Config, question: &str) -> Result<()> {
    let engine = TutorEngine::from_config(config)?;
    let outcome = engine.answer(question, &Session::new()).await?;

    info!(
        attempts = outcome.answer.attempts,
        verification = ?outcome.answer.verification,
        "Turn finished"
    );
    println!("{}", final_answer_block(&outcome.answer.text));
    Ok(())
}

async fn run_repl(config: &Config, show_progress: bool) -> Result<()> {
    let engine = TutorEngine::from_config(config)?;

    let mut repl = match ReplSession::default_history_path() {
        Some(path) => ReplSession::with_history(path, show_progress)?,
        None => ReplSession::new(show_progress)?,
    };
    repl.run(&engine, &config.oracle.model).await
}

async fn run_doctor(config: Config) {
    let checks = Doctor::new(config).run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(config: &Config) -> Result<()> {
    println!("\nCourseBuddy Configuration\n");

    match Config::config_path() {
        Ok(path) => println!("Config file: {}\n", path.display()),
        Err(_) => println!("Config file: <unknown home directory>\n"),
    }
    println!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);

    match Settings::load(&config.data.settings_file) {
        Ok(settings) => {
            let profile = settings.course_profile();
            println!("Course:");
            println!("  Class:      {}", profile.class_name);
            println!("  Professor:  {}", profile.professor);
            println!("  Assistants: {}", profile.assistants);
            println!("  Assistant:  {}", profile.assistant_name);
            println!("  Embedder:   {}", settings.embedding_choice().describe());
        }
        Err(e) => println!("Course settings unavailable: {}", e),
    }
    println!();

    Ok(())
}
