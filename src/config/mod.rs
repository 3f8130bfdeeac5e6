//! # Configuration Management Module
//!
//! Loads and persists the TOML configuration for grouptitles. The configuration
//! carries the title feature flag and rule set, the storage location, and
//! logging settings.
//!
//! ## Configuration File Format
//!
//! ```toml
//! [titles]
//! enabled = true
//! rules = [
//!     "Staff|Jr|Sr|Lead|Chief",
//!     "Helpers|Helper|Helper|Senior Helper|Senior Helper",
//! ]
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "grouptitles.log"
//! ```
//!
//! Each `rules` entry is a pipe-delimited line: the first field is the group
//! name, the following fields are the titles for trust levels 1 through 4.
//! Trailing fields are optional. A single entry may also hold several
//! newline-separated rule lines.
//!
//! The title engine reloads this file on every event, so edits to `[titles]`
//! take effect without a restart. See [`crate::titles::engine`].

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub titles: TitlesConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Feature flag and rule set for automatic titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitlesConfig {
    /// Global kill switch. When false, every resolution is a no-op.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Rule lines of the form `group|tl1Title|tl2Title|tl3Title|tl4Title`.
    /// A rule needs a group name and at least one title field to ever apply.
    #[serde(default)]
    pub rules: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for TitlesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            titles: TitlesConfig::default(),
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("grouptitles.log".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_config_defaults() {
        let config = TitlesConfig::default();
        assert!(config.enabled);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn titles_section_optional() {
        // A config file written before the titles feature existed still loads.
        let toml_src = r#"
            [storage]
            data_dir = "./data"

            [logging]
            level = "info"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(config.titles.enabled);
        assert!(config.titles.rules.is_empty());
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn titles_section_parses_rules() {
        let toml_src = r#"
            [titles]
            enabled = false
            rules = ["Staff|Jr|Sr|Lead|Chief"]

            [storage]
            data_dir = "/tmp/gt"

            [logging]
            level = "debug"
            file = "gt.log"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(!config.titles.enabled);
        assert_eq!(config.titles.rules, vec!["Staff|Jr|Sr|Lead|Chief"]);
        assert_eq!(config.storage.data_dir, "/tmp/gt");
    }

    #[test]
    fn default_config_round_trips() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert!(parsed.titles.enabled);
        assert_eq!(parsed.storage.data_dir, "./data");
        assert_eq!(parsed.logging.level, "info");
    }
}
