//! Test utilities & fixtures shared by the integration tests.

use chrono::Utc;
use grouptitles::config::{Config, LoggingConfig, StorageConfig, TitlesConfig};
use grouptitles::storage::User;
use std::path::Path;

/// Config rooted at `data_dir` with the given rule lines. Logging stays
/// file-free so tests never write into the working directory.
#[allow(dead_code)]
pub fn test_config(data_dir: &str, enabled: bool, rules: &[&str]) -> Config {
    Config {
        titles: TitlesConfig {
            enabled,
            rules: rules.iter().map(|r| r.to_string()).collect(),
        },
        storage: StorageConfig {
            data_dir: data_dir.to_string(),
        },
        logging: LoggingConfig {
            level: "error".into(),
            file: None,
        },
    }
}

/// Serialize `config` to `<dir>/config.toml` and return the path as a string.
#[allow(dead_code)]
pub async fn write_config(dir: &Path, config: &Config) -> String {
    let path = dir.join("config.toml");
    let serialized = toml::to_string_pretty(config).expect("serialize config");
    tokio::fs::write(&path, serialized).await.expect("write config");
    path.to_str().expect("utf-8 path").to_string()
}

/// Build a user record with the bits title resolution cares about.
#[allow(dead_code)]
pub fn test_user(
    id: u64,
    username: &str,
    trust_level: u8,
    primary_group: Option<(u64, &str)>,
    title: Option<&str>,
) -> User {
    let now = Utc::now();
    User {
        id,
        username: username.to_string(),
        trust_level,
        primary_group_id: primary_group.map(|(gid, _)| gid),
        primary_group: primary_group.map(|(_, name)| name.to_string()),
        title: title.map(str::to_string),
        first_seen: now,
        last_seen: now,
    }
}
