//! Doctor command: checks that a course deployment can answer questions

use colored::*;
use std::path::Path;
use std::time::Duration;

use crate::config::{Config, OracleBackend};
use crate::embedding::engine::hub_repo_id;
use crate::embedding::openai::model_dimension;
use crate::errors::Result;
use crate::index::CourseIndex;
use crate::oracle::ollama::{OllamaOracle, DEFAULT_OLLAMA_URL};
use crate::settings::{EmbeddingChoice, Settings};

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass(String),
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Output dimension of embedding models whose size is known without loading them
pub fn known_dimension(choice: &EmbeddingChoice) -> Option<usize> {
    match choice {
        EmbeddingChoice::OpenAi { model } => Some(model_dimension(model)),
        EmbeddingChoice::SentenceTransformer { model } => match hub_repo_id(model).as_str() {
            "sentence-transformers/all-MiniLM-L6-v2"
            | "sentence-transformers/all-MiniLM-L12-v2"
            | "sentence-transformers/paraphrase-MiniLM-L6-v2" => Some(384),
            "sentence-transformers/all-mpnet-base-v2" => Some(768),
            _ => None,
        },
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let settings = Settings::load(&self.config.data.settings_file);
        let index = CourseIndex::load(
            &self.config.data.index_path(),
            &self.config.data.metadata_path(),
        );

        let mut checks = vec![check_settings(&settings), check_index(&index)];
        if let (Ok(settings), Ok(index)) = (&settings, &index) {
            checks.push(check_embedder(settings, index));
        }
        checks.push(self.check_oracle().await);
        checks
    }

    async fn check_oracle(&self) -> HealthCheck {
        let oracle = &self.config.oracle;
        let status = match oracle.backend {
            OracleBackend::OpenAi => {
                if self.config.api_key().is_some() {
                    HealthStatus::Pass(format!("openai, model {}", oracle.model))
                } else {
                    HealthStatus::Fail(format!("{} is not set", oracle.api_key_env))
                }
            }
            OracleBackend::Ollama => {
                let url = oracle.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
                match OllamaOracle::new(url, &oracle.model, Duration::from_secs(5)) {
                    Ok(client) => match client.health_check().await {
                        Ok(true) => HealthStatus::Pass(format!("ollama at {}, model {}", url, oracle.model)),
                        _ => HealthStatus::Fail(format!("Ollama not reachable at {}", url)),
                    },
                    Err(e) => HealthStatus::Fail(e.to_string()),
                }
            }
        };
        HealthCheck::new("Language model", status)
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "CourseBuddy Diagnostics".bold().cyan());
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(60));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass(msg) => format!("PASS {}", msg).green(),
                HealthStatus::Warn(msg) => format!("WARN {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("FAIL {}", msg).red(),
            };
            println!("{:<20} {}", check.name, status);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn check_settings(settings: &Result<Settings>) -> HealthCheck {
    let status = match settings {
        Ok(settings) => {
            let profile = settings.course_profile();
            if profile.class_name.is_empty() {
                HealthStatus::Warn("classname is not set".to_string())
            } else {
                HealthStatus::Pass(format!("{} ({} keys)", profile.class_name, settings.len()))
            }
        }
        Err(e) => HealthStatus::Fail(e.to_string()),
    };
    HealthCheck::new("Course settings", status)
}

fn check_index(index: &Result<CourseIndex>) -> HealthCheck {
    let status = match index {
        Ok(index) => HealthStatus::Pass(format!(
            "{} chunks, dimension {}, {} source files",
            index.len(),
            index.dimension(),
            index.source_files().len()
        )),
        Err(e) => HealthStatus::Fail(e.to_string()),
    };
    HealthCheck::new("Course index", status)
}

fn check_embedder(settings: &Settings, index: &CourseIndex) -> HealthCheck {
    let choice = settings.embedding_choice();
    let status = match known_dimension(&choice) {
        Some(dimension) if dimension == index.dimension() => HealthStatus::Pass(choice.describe()),
        Some(dimension) => HealthStatus::Fail(format!(
            "{} produces {} dimensions, index has {}",
            choice.describe(),
            dimension,
            index.dimension()
        )),
        None => HealthStatus::Warn(format!("{}: dimension checked at startup", choice.describe())),
    };
    HealthCheck::new("Query embedder", status)
}

/// True when every data file the engine needs is present
pub fn data_files_present(config: &Config) -> bool {
    [
        config.data.index_path(),
        config.data.metadata_path(),
        config.data.settings_file.clone(),
    ]
    .iter()
    .all(|path| Path::new(path).exists())
}
