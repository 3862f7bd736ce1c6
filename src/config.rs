//! Pipeline configuration
//!
//! Persisted as TOML under `~/.askdocs/config.toml`. Loading creates the
//! default file on first use so every knob is visible and editable.

use crate::backend::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL};
use crate::generation::ControllerConfig;
use crate::prompts::ComposerConfig;
use crate::retrieval::RetrievalConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    /// Deadline for the streaming phase, in seconds
    pub stream_timeout_secs: u64,
    /// Attempt bound for establishing the backend call
    pub max_attempts: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream_timeout_secs: 120,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    /// Embedding dimension D every indexed vector must match
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: 768,
        }
    }
}

impl Config {
    /// Load configuration from file, creating the default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".askdocs").join("config.toml"))
    }

    /// Controller parameters derived from the backend section
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            stream_timeout: Duration::from_secs(self.backend.stream_timeout_secs),
            history_turns: self.composer.max_history_turns,
            max_attempts: self.backend.max_attempts,
            ..ControllerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retrieval.alpha, 0.7);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.backend.model, DEFAULT_MODEL);
        assert_eq!(config.embedding.dimension, 768);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.retrieval.alpha = 0.5;
        config.backend.model = "llama3:8b".to_string();

        let toml_string = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.retrieval.alpha, 0.5);
        assert_eq!(parsed.backend.model, "llama3:8b");
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[backend]\nbase_url = \"http://x\"\nmodel = \"m\"\nstream_timeout_secs = 30\nmax_attempts = 2\n").unwrap();
        assert_eq!(parsed.backend.stream_timeout_secs, 30);
        assert_eq!(parsed.retrieval.top_k, 5);
    }

    #[test]
    fn test_controller_config_derivation() {
        let mut config = Config::default();
        config.backend.stream_timeout_secs = 45;
        config.composer.max_history_turns = 4;

        let controller = config.controller_config();
        assert_eq!(controller.stream_timeout, Duration::from_secs(45));
        assert_eq!(controller.history_turns, 4);
    }
}
