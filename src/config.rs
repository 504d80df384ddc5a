//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

use crate::error::{PackmonError, Result};
use crate::producer::ProducerTiming;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub backlog: BacklogConfig,
}

/// Storage paths for the record log and schema metadata
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default = "default_meta_file")]
    pub meta_file: String,
}

/// Sampling cadence
#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// Backlog replay pacing
#[derive(Debug, Deserialize, Clone)]
pub struct BacklogConfig {
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

// Default value functions
fn default_data_dir() -> String { "./data".to_string() }
fn default_log_file() -> String { "battery.bin".to_string() }
fn default_meta_file() -> String { "schema_meta.json".to_string() }

fn default_interval_ms() -> u64 { 5000 }

fn default_pacing_ms() -> u64 { 20 }
fn default_cooldown_ms() -> u64 { 200 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: default_log_file(),
            meta_file: default_meta_file(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate loaded values
    pub fn validate(&self) -> Result<()> {
        if self.sampler.interval_ms == 0 {
            return Err(PackmonError::InvalidConfig(
                "sampler.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.storage.data_dir.is_empty() {
            return Err(PackmonError::InvalidConfig(
                "storage.data_dir must not be empty".to_string(),
            ));
        }
        if self.storage.log_file.is_empty() || self.storage.meta_file.is_empty() {
            return Err(PackmonError::InvalidConfig(
                "storage file names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Full path of the record log file
    pub fn log_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(&self.storage.log_file)
    }

    /// Full path of the schema metadata document
    pub fn meta_path(&self) -> PathBuf {
        Path::new(&self.storage.data_dir).join(&self.storage.meta_file)
    }

    /// Producer loop timing derived from configuration
    pub fn producer_timing(&self) -> ProducerTiming {
        ProducerTiming {
            sample_interval: Duration::from_millis(self.sampler.interval_ms),
            replay_pacing: Duration::from_millis(self.backlog.pacing_ms),
            replay_cooldown: Duration::from_millis(self.backlog.cooldown_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.storage.log_file, "battery.bin");
        assert_eq!(config.storage.meta_file, "schema_meta.json");
        assert_eq!(config.sampler.interval_ms, 5000);
        assert_eq!(config.backlog.pacing_ms, 20);
        assert_eq!(config.backlog.cooldown_ms, 200);
    }

    #[test]
    fn test_partial_overrides() {
        let config = Config::from_toml(
            r#"
            [storage]
            data_dir = "/var/lib/packmon"

            [sampler]
            interval_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.data_dir, "/var/lib/packmon");
        assert_eq!(config.storage.log_file, "battery.bin");
        assert_eq!(config.sampler.interval_ms, 1000);
    }

    #[test]
    fn test_paths_join_data_dir() {
        let config = Config::from_toml("[storage]\ndata_dir = \"/tmp/pm\"\n").unwrap();

        assert_eq!(config.log_path(), PathBuf::from("/tmp/pm/battery.bin"));
        assert_eq!(config.meta_path(), PathBuf::from("/tmp/pm/schema_meta.json"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Config::from_toml("[sampler]\ninterval_ms = 0\n");
        assert!(matches!(result, Err(PackmonError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let result = Config::from_toml("[storage]\ndata_dir = \"\"\n");
        assert!(matches!(result, Err(PackmonError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = Config::from_toml("[storage\n");
        assert!(matches!(result, Err(PackmonError::Config(_))));
    }

    #[test]
    fn test_producer_timing_conversion() {
        let config = Config::from_toml(
            r#"
            [sampler]
            interval_ms = 2000

            [backlog]
            pacing_ms = 5
            cooldown_ms = 50
            "#,
        )
        .unwrap();

        let timing = config.producer_timing();
        assert_eq!(timing.sample_interval, Duration::from_millis(2000));
        assert_eq!(timing.replay_pacing, Duration::from_millis(5));
        assert_eq!(timing.replay_cooldown, Duration::from_millis(50));
    }
}
