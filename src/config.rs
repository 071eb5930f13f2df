use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const KILOBYTE: u64 = 1024;
pub const MEGABYTE: u64 = 1024 * KILOBYTE;
pub const GIGABYTE: u64 = 1024 * MEGABYTE;

/// Writer configuration, immutable for the life of a writer instance
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Path of the live log file
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Number of numbered backups to retain
    #[serde(default = "default_max_backups")]
    pub max_backups: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_size: default_max_size(),
            max_backups: default_max_backups(),
        }
    }
}

// Default functions for serde
fn default_path() -> String {
    "logs/app.log".to_string()
}
fn default_max_size() -> u64 {
    10 * MEGABYTE
}
fn default_max_backups() -> u64 {
    5
}

impl Config {
    /// Load configuration from a file path, `.json` as JSON, anything else as YAML
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", path))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", path))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            anyhow::bail!("max-size must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: Config = serde_yaml::from_str("path: out.log").unwrap();
        assert_eq!(config.path, "out.log");
        assert_eq!(config.max_size, 10 * MEGABYTE);
        assert_eq!(config.max_backups, 5);
    }

    #[test]
    fn json_uses_kebab_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{"path": "logs/test.log", "max-size": 3072, "max-backups": 15}"#,
        )
        .unwrap();
        assert_eq!(config.path, "logs/test.log");
        assert_eq!(config.max_size, 3 * KILOBYTE);
        assert_eq!(config.max_backups, 15);
    }

    #[test]
    fn zero_max_size_is_rejected() {
        let config = Config {
            max_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
