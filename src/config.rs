//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values (the canonical `public < private` ranking)
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments
//!
//! Ranking overrides from the environment or the command line are comma
//! separated, lowest trust first: `guest,member,moderator`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::delegate::FieldMapperDelegate;
use crate::permission::{Ranking, level};
use crate::record::Record;

/// Serialization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Permission ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Level tokens, lowest trust first.
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            levels: default_levels(),
        }
    }
}

fn default_levels() -> Vec<String> {
    level::CANONICAL.iter().map(|t| t.to_string()).collect()
}

impl Config {
    /// The configured ranking, validated.
    pub fn ranking(&self) -> crate::Result<Ranking> {
        Ranking::new(self.ranking.levels.iter().map(String::as_str))
            .map_err(|e| Error::Config(format!("Invalid ranking: {e}")))
    }

    /// A delegate for `source_key` using the configured ranking.
    ///
    /// A configured ranking equal to the canonical one keeps the canonical
    /// accessors available.
    pub fn delegate(&self, source_key: &str) -> crate::Result<FieldMapperDelegate> {
        let ranking = self.ranking()?;
        Ok(if ranking.is_canonical() {
            FieldMapperDelegate::new(source_key)
        } else {
            FieldMapperDelegate::with_ranking(source_key, ranking)
        })
    }

    /// A record whose fields use the configured ranking.
    pub fn record(&self, name: &str) -> crate::Result<Record> {
        let ranking = self.ranking()?;
        Ok(if ranking.is_canonical() {
            Record::new(name)
        } else {
            Record::with_ranking(name, ranking)
        })
    }
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct Loader {
    /// Environment variable prefix (e.g., "MYAPP" -> MYAPP_RANKING)
    pub env_prefix: String,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            env_prefix: "VISOR".to_string(),
        }
    }
}

impl Loader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
        }
    }

    /// Load configuration from file, environment, and CLI arguments.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `cli_ranking` - CLI override for the ranking, comma separated
    pub fn load(
        &self,
        config_path: Option<&Path>,
        cli_ranking: Option<&str>,
    ) -> crate::Result<Config> {
        // Start with file config or defaults
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        // Override with environment variables
        let prefix = &self.env_prefix;

        if let Ok(levels) = std::env::var(format!("{prefix}_RANKING")) {
            config.ranking.levels = split_levels(&levels);
        }

        // Override with CLI arguments
        if let Some(levels) = cli_ranking {
            config.ranking.levels = split_levels(levels);
        }

        // Validate
        config.ranking()?;

        Ok(config)
    }
}

fn split_levels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
