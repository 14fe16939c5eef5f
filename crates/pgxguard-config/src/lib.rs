//! Configuration loading for PGxGuard.
//! Reads pgxguard.toml from the current directory or the path in the PGXGUARD_CONFIG
//! env var; every field has a default so a missing file yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Path to the persisted rule-table document.
    #[serde(default = "default_rules_path")]
    pub path: String,
}

fn default_rules_path() -> String {
    "data/cpic_rules.json".to_string()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Per-request drug cap for batch assessment.
    #[serde(default = "default_max_drugs")]
    pub max_drugs: usize,
}

fn default_max_drugs() -> usize {
    20
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_drugs: default_max_drugs(),
        }
    }
}

impl Config {
    /// Load from PGXGUARD_CONFIG, falling back to ./pgxguard.toml, falling back to
    /// defaults when neither exists.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("PGXGUARD_CONFIG").unwrap_or_else(|_| "pgxguard.toml".to_string());
        if !Path::new(&path).exists() {
            info!(path = %path, "No config file found; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&raw)?;
        info!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }
}
