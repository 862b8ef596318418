use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Engine configuration (`~/.coursebuddy/config.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Language-model backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    OpenAi,
    Ollama,
}

impl std::str::FromStr for OracleBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(OracleBackend::OpenAi),
            "ollama" => Ok(OracleBackend::Ollama),
            other => Err(format!("Unknown oracle backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub model: String,
    /// Overrides the backend's default endpoint
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::OpenAi,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub index_file: String,
    pub metadata_file: String,
    pub settings_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            index_file: "faiss_index.bin".to_string(),
            metadata_file: "faiss_metadata.json".to_string(),
            settings_file: PathBuf::from("settings.txt"),
        }
    }
}

impl DataConfig {
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(&self.index_file)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(&self.metadata_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved for the first attempt
    pub top_k: usize,
    /// Chunks retrieved when verification rejects the first reply
    pub retry_top_k: usize,
    /// Characters of context kept in the session
    pub session_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            retry_top_k: 5,
            session_max_chars: 3900,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".coursebuddy").join("config.toml"))
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let retrieval = &self.retrieval;
        anyhow::ensure!(retrieval.top_k > 0, "retrieval.top_k must be greater than zero");
        anyhow::ensure!(
            retrieval.retry_top_k >= retrieval.top_k,
            "retrieval.retry_top_k ({}) must be at least top_k ({})",
            retrieval.retry_top_k,
            retrieval.top_k
        );
        anyhow::ensure!(
            retrieval.session_max_chars > 0,
            "retrieval.session_max_chars must be greater than zero"
        );
        anyhow::ensure!(!self.oracle.model.trim().is_empty(), "oracle.model is required");
        Ok(())
    }

    /// API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.oracle.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
