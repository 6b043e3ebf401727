//! Configuration management for magpie
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (MAGPIE_*)
//! 3. Config file (~/.config/magpie/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the webhook listener binds to
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (default: ~/.cache/magpie/magpie.db)
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Configured database path, falling back to the default cache location
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(magpie_db::Database::default_path()?),
        }
    }
}

/// Review pipeline limits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Diffs longer than this many lines are skipped
    pub max_diff_lines: usize,

    /// Changes below this many total changed lines count as trivial
    pub trivial_change_lines: u64,

    /// Retries per pipeline step on transient failures
    pub max_step_retries: u32,

    /// Delay between step retries
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_diff_lines: 10_000,
            trivial_change_lines: 20,
            max_step_retries: 2,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Generative review service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier sent with every review request
    pub name: String,

    /// API base URL
    pub base_url: String,

    /// Maximum output tokens per review
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Review pipeline limits
    pub review: ReviewConfig,

    /// Generative review service configuration
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/magpie/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("magpie").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - MAGPIE_BIND_ADDR: webhook listener address
    /// - MAGPIE_DB_PATH: SQLite database path
    /// - MAGPIE_MODEL: model identifier
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bind_addr) = std::env::var("MAGPIE_BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }

        if let Ok(db_path) = std::env::var("MAGPIE_DB_PATH") {
            self.database.path = Some(PathBuf::from(db_path));
        }

        if let Ok(model) = std::env::var("MAGPIE_MODEL") {
            self.model.name = model;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        bind_addr: Option<String>,
        db_path: Option<PathBuf>,
        model: Option<String>,
    ) -> Self {
        if let Some(addr) = bind_addr {
            self.server.bind_addr = addr;
        }

        if let Some(path) = db_path {
            self.database.path = Some(path);
        }

        if let Some(m) = model {
            self.model.name = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        bind_addr: Option<String>,
        db_path: Option<PathBuf>,
        model: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(bind_addr, db_path, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert!(config.database.path.is_none());
        assert_eq!(config.review.max_diff_lines, 10_000);
        assert_eq!(config.review.trivial_change_lines, 20);
        assert_eq!(config.review.max_step_retries, 2);
        assert_eq!(config.model.name, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_resolve_db_path_prefers_configured() {
        let config = DatabaseConfig {
            path: Some(PathBuf::from("/tmp/custom.db")),
        };
        assert_eq!(
            config.resolve_path().unwrap(),
            PathBuf::from("/tmp/custom.db")
        );
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some("0.0.0.0:9090".to_string()),
            Some(PathBuf::from("/tmp/magpie.db")),
            Some("claude-opus-4-20250514".to_string()),
        );

        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/magpie.db")));
        assert_eq!(config.model.name, "claude-opus-4-20250514");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[server]
bind_addr = "0.0.0.0:8080"

[review]
max_diff_lines = 5000
retry_delay = "30s"

[model]
name = "claude-sonnet-4-20250514"
max_tokens = 4096
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.review.max_diff_lines, 5000);
        assert_eq!(config.review.retry_delay, Duration::from_secs(30));
        assert_eq!(config.model.max_tokens, 4096);
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[review]
max_diff_lines = 2000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // Unset sections and keys fall back to defaults
        assert_eq!(config.review.max_diff_lines, 2000);
        assert_eq!(config.review.max_step_retries, 2);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    }
}
