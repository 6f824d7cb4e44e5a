//! Configuration management for convlog
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ConvlogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for convlog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where conversation files live
    #[serde(default)]
    pub storage: StorageConfig,
    /// Values stamped onto newly created sessions
    #[serde(default)]
    pub session: SessionConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage root holding `sessions/`, `index.json` and `memory.json`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// How long to wait for another writer to release the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from(".conversations")
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Lock timeout as a `Duration`
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Defaults for new sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `user.id` recorded on new sessions
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// `metadata` recorded on new sessions
    #[serde(default = "default_metadata")]
    pub metadata: BTreeMap<String, String>,
}

fn default_user_id() -> String {
    "user-1".to_string()
}

fn default_metadata() -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("project".to_string(), "angular-dev".to_string());
    metadata
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            metadata: default_metadata(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "convlog.yaml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead. Nothing is
    /// logged here since tracing is configured from the result.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Config` if the file exists but cannot be read
    /// or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConvlogError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ConvlogError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(root) = std::env::var("CONVLOG_ROOT") {
            self.storage.root = PathBuf::from(root);
        }

        if let Ok(user_id) = std::env::var("CONVLOG_USER_ID") {
            self.session.user_id = user_id;
        }

        if let Ok(level) = std::env::var("CONVLOG_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(root) = &cli.root {
            self.storage.root = root.clone();
        }
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
        if cli.json_logs {
            self.logging.json = true;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConvlogError::Config` naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.as_os_str().is_empty() {
            return Err(
                ConvlogError::Config("storage.root cannot be empty".to_string()).into(),
            );
        }

        if self.storage.lock_timeout_ms == 0 {
            return Err(ConvlogError::Config(
                "storage.lock_timeout_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.user_id.trim().is_empty() {
            return Err(
                ConvlogError::Config("session.user_id cannot be empty".to_string()).into(),
            );
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConvlogError::Config(format!(
                "Invalid logging.level: {}. Must be one of: {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::test_utils::{assert_error_contains, create_test_file, temp_dir, test_config_yaml};
    use serial_test::serial;

    fn bare_cli() -> Cli {
        Cli::default()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.root, PathBuf::from(".conversations"));
        assert_eq!(config.storage.lock_timeout_ms, 5000);
        assert_eq!(config.session.user_id, "user-1");
        assert_eq!(config.session.metadata["project"], "angular-dev");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_root() {
        let mut config = Config::default();
        config.storage.root = PathBuf::new();
        assert_error_contains(config.validate(), "storage.root");
    }

    #[test]
    fn test_config_validation_zero_lock_timeout() {
        let mut config = Config::default();
        config.storage.lock_timeout_ms = 0;
        assert_error_contains(config.validate(), "lock_timeout_ms");
    }

    #[test]
    fn test_config_validation_blank_user() {
        let mut config = Config::default();
        config.session.user_id = "  ".to_string();
        assert_error_contains(config.validate(), "session.user_id");
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert_error_contains(config.validate(), "Invalid logging.level: loud");
    }

    #[test]
    fn test_config_from_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/var/lib/convlog"));
        assert_eq!(config.storage.lock_timeout_ms, 250);
        assert_eq!(config.session.user_id, "tester");
        assert_eq!(config.session.metadata["project"], "convlog");
        assert!(config.logging.json);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("session:\n  user_id: me\n").unwrap();
        assert_eq!(config.session.user_id, "me");
        assert_eq!(config.session.metadata["project"], "angular-dev");
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &bare_cli()).unwrap();
        assert_eq!(config.session.user_id, "user-1");
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_is_config_error() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "convlog.yaml", "storage: [unclosed");
        let err = Config::load(path.to_str().unwrap(), &bare_cli()).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: Failed to parse config"));
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "convlog.yaml", &test_config_yaml());
        std::env::set_var("CONVLOG_ROOT", "/tmp/from-env");
        std::env::set_var("CONVLOG_USER_ID", "env-user");

        let config = Config::load(path.to_str().unwrap(), &bare_cli());

        std::env::remove_var("CONVLOG_ROOT");
        std::env::remove_var("CONVLOG_USER_ID");

        let config = config.unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/tmp/from-env"));
        assert_eq!(config.session.user_id, "env-user");
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        std::env::set_var("CONVLOG_ROOT", "/tmp/from-env");
        let mut cli = bare_cli();
        cli.root = Some(PathBuf::from("/tmp/from-cli"));
        cli.verbose = true;
        cli.json_logs = true;

        let config = Config::load("nonexistent.yaml", &cli);
        std::env::remove_var("CONVLOG_ROOT");

        let config = config.unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/tmp/from-cli"));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_lock_timeout_duration() {
        let config = StorageConfig {
            lock_timeout_ms: 1500,
            ..StorageConfig::default()
        };
        assert_eq!(config.lock_timeout(), Duration::from_millis(1500));
    }
}
