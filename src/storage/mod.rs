//! # Storage Module - User and Audit Persistence
//!
//! File-backed persistence for the slice of forum state this extension needs:
//! user records and the title-change audit trail.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── users/            ← one JSON document per user (percent-encoded filename)
//! └── title_audit.log   ← JSON-lines record of applied title changes
//! ```
//!
//! ## Behavior
//!
//! - **Atomic Writes**: Every write takes an exclusive lock on the destination,
//!   lands in a temp file first, and is renamed into place.
//! - **Defensive Reads**: Oversized or corrupt user files are skipped with a
//!   warning instead of failing the whole operation.
//! - **Single Side Effect**: [`Storage::update_title`] is the only mutation the
//!   title engine performs; it also appends the audit entry.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::validation::{safe_filename, secure_json_parse, validate_file_size};

/// Size cap for a single user record file.
const MAX_USER_FILE_BYTES: u64 = 100_000;

/// Main storage interface
pub struct Storage {
    data_dir: String,
}

/// Forum user record, reduced to the fields title assignment reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub trust_level: u8,
    /// Id of the group the user designated as primary, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_group_id: Option<u64>,
    /// Name of the primary group, denormalized onto the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_group: Option<String>,
    /// Display title shown alongside the username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// One applied title change, appended to `title_audit.log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleAuditEntry {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub old_title: Option<String>,
    pub new_title: String,
    /// Which surface triggered the change: an event kind or "cli".
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleStatistics {
    pub total_users: u32,
    pub titled_users: u32,
}

impl Storage {
    /// Initialize storage with the given data directory
    pub async fn new(data_dir: &str) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .await
            .map_err(|e| anyhow!("Failed to create data directory {}: {}", data_dir, e))?;

        let users_dir = Path::new(data_dir).join("users");
        fs::create_dir_all(&users_dir).await?;

        Ok(Storage {
            data_dir: data_dir.to_string(),
        })
    }

    fn user_path(&self, username: &str) -> std::path::PathBuf {
        Path::new(&self.data_dir)
            .join("users")
            .join(format!("{}.json", safe_filename(username)))
    }

    /// Fetch a user record by username. Returns `Ok(None)` when absent.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let user_file = self.user_path(username);

        if !user_file.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&user_file).await?;
        validate_file_size(metadata.len(), MAX_USER_FILE_BYTES)
            .map_err(|e| anyhow!("User file too large: {}", e))?;

        let content = fs::read_to_string(user_file).await?;
        let user: User = secure_json_parse(&content, MAX_USER_FILE_BYTES as usize)
            .map_err(|e| anyhow!("Failed to parse user file: {}", e))?;

        Ok(Some(user))
    }

    /// Fetch a user record by numeric id, scanning the users directory.
    ///
    /// Event payloads identify users by id while records are filed by
    /// username; the user population this extension manages is small enough
    /// that a scan is fine.
    pub async fn get_user_by_id(&self, id: u64) -> Result<Option<User>> {
        let users_dir = Path::new(&self.data_dir).join("users");
        let mut entries = fs::read_dir(&users_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if !entry.path().extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            if let Ok(metadata) = entry.metadata().await {
                if validate_file_size(metadata.len(), MAX_USER_FILE_BYTES).is_err() {
                    warn!("Skipping oversized user file: {:?}", entry.path());
                    continue;
                }
            }
            let content = fs::read_to_string(entry.path()).await?;
            match secure_json_parse::<User>(&content, MAX_USER_FILE_BYTES as usize) {
                Ok(user) if user.id == id => return Ok(Some(user)),
                Ok(_) => {}
                Err(_) => warn!("Skipping unreadable user file: {:?}", entry.path()),
            }
        }
        Ok(None)
    }

    /// All stored usernames, sorted.
    pub async fn list_usernames(&self) -> Result<Vec<String>> {
        let users_dir = Path::new(&self.data_dir).join("users");
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&users_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if !entry.path().extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let content = fs::read_to_string(entry.path()).await?;
            match secure_json_parse::<User>(&content, MAX_USER_FILE_BYTES as usize) {
                Ok(user) => names.push(user.username),
                Err(_) => warn!("Skipping unreadable user file: {:?}", entry.path()),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create or replace a user record.
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        let user_file = self.user_path(&user.username);
        let json_content = serde_json::to_string_pretty(user)?;
        Self::write_locked(&user_file, &json_content, WriteMode::Replace).await
    }

    /// Set a user's display title. Returns the updated record.
    ///
    /// The one side-effecting step of title assignment: persists the record
    /// and appends the audit entry. Callers decide beforehand whether a
    /// change is warranted at all.
    pub async fn update_title(&self, username: &str, new_title: &str, source: &str) -> Result<User> {
        let user_file = self.user_path(username);
        if !user_file.exists() {
            return Err(anyhow!("User '{}' not found", username));
        }
        let content = fs::read_to_string(&user_file).await?;
        let mut user: User = secure_json_parse(&content, MAX_USER_FILE_BYTES as usize)
            .map_err(|e| anyhow!("Failed to parse user file: {}", e))?;

        let old_title = user.title.take();
        user.title = Some(new_title.to_string());
        user.last_seen = Utc::now();
        let json_content = serde_json::to_string_pretty(&user)?;
        Self::write_locked(&user_file, &json_content, WriteMode::Replace).await?;

        self.log_title_change(username, old_title.as_deref(), new_title, source)
            .await?;

        Ok(user)
    }

    /// Append one title-change record to the audit log.
    pub async fn log_title_change(
        &self,
        username: &str,
        old_title: Option<&str>,
        new_title: &str,
        source: &str,
    ) -> Result<()> {
        let path = Path::new(&self.data_dir).join("title_audit.log");
        let entry = TitleAuditEntry {
            timestamp: Utc::now(),
            username: username.to_string(),
            old_title: old_title.map(str::to_string),
            new_title: new_title.to_string(),
            source: source.to_string(),
        };
        let line = serde_json::to_string(&entry)? + "\n";
        Self::write_locked(&path, &line, WriteMode::Append).await
    }

    /// Fetch a page of title audit entries (newest first). `page` is 1-based.
    pub async fn get_title_audit_page(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<TitleAuditEntry>> {
        let path = Path::new(&self.data_dir).join("title_audit.log");
        if !path.exists() {
            return Ok(vec![]);
        }
        let content = fs::read_to_string(&path).await?;
        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TitleAuditEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) => continue, // Skip malformed lines
            }
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let start = page.saturating_sub(1) * page_size;
        Ok(entries.into_iter().skip(start).take(page_size).collect())
    }

    /// User counts for the status surface.
    pub async fn get_statistics(&self) -> Result<TitleStatistics> {
        let users_dir = Path::new(&self.data_dir).join("users");
        let mut total_users = 0;
        let mut titled_users = 0;

        let mut entries = fs::read_dir(&users_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if !entry.path().extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let content = fs::read_to_string(entry.path()).await?;
            if let Ok(user) = secure_json_parse::<User>(&content, MAX_USER_FILE_BYTES as usize) {
                total_users += 1;
                if user.title.as_deref().is_some_and(|t| !t.is_empty()) {
                    titled_users += 1;
                }
            }
        }

        Ok(TitleStatistics {
            total_users,
            titled_users,
        })
    }

    /// Write `content` to `path` under an exclusive lock, going through a
    /// temp file and an atomic rename so readers never observe a torn write.
    /// `Append` folds the existing content in before writing.
    async fn write_locked(path: &Path, content: &str, mode: WriteMode) -> Result<()> {
        use std::fs::{File, OpenOptions};
        use std::io::{Read, Write};

        // fs2 locks are synchronous; these files are tiny.
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let mut payload = String::new();
        if matches!(mode, WriteMode::Append) {
            let mut existing = String::new();
            let _ = (&lock_file).read_to_string(&mut existing);
            payload.push_str(&existing);
        }
        payload.push_str(content);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let base = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("data.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(payload.as_bytes())?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                    continue;
                }
                Err(e) => return Err(anyhow!("Failed to create temp file for atomic write: {}", e)),
            }
        };

        std::fs::rename(&tmp_path, path)?;
        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }
        drop(lock_file);
        Ok(())
    }
}

enum WriteMode {
    Replace,
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(id: u64, username: &str) -> User {
        let now = Utc::now();
        User {
            id,
            username: username.to_string(),
            trust_level: 1,
            primary_group_id: None,
            primary_group: None,
            title: None,
            first_seen: now,
            last_seen: now,
        }
    }

    #[tokio::test]
    async fn user_round_trips_through_json() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_str().unwrap()).await.unwrap();

        let mut user = sample_user(7, "alice");
        user.primary_group = Some("Staff".to_string());
        user.primary_group_id = Some(3);
        storage.upsert_user(&user).await.unwrap();

        let loaded = storage.get_user("alice").await.unwrap().unwrap();
        assert_eq!(loaded.id, 7);
        assert_eq!(loaded.primary_group.as_deref(), Some("Staff"));
        assert_eq!(loaded.primary_group_id, Some(3));
        assert!(loaded.title.is_none());
    }

    #[tokio::test]
    async fn usernames_with_separators_get_safe_files() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_str().unwrap()).await.unwrap();

        storage.upsert_user(&sample_user(1, "a/b c")).await.unwrap();
        let loaded = storage.get_user("a/b c").await.unwrap().unwrap();
        assert_eq!(loaded.username, "a/b c");
        // File must live directly under users/, not in a subdirectory.
        assert!(tmp.path().join("users").join("a%2Fb%20c.json").exists());
    }

    #[tokio::test]
    async fn update_title_writes_record_and_audit() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_str().unwrap()).await.unwrap();

        storage.upsert_user(&sample_user(1, "bob")).await.unwrap();
        let updated = storage.update_title("bob", "Sr", "user_promoted").await.unwrap();
        assert_eq!(updated.title.as_deref(), Some("Sr"));

        let audit = storage.get_title_audit_page(1, 10).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].username, "bob");
        assert_eq!(audit[0].old_title, None);
        assert_eq!(audit[0].new_title, "Sr");
        assert_eq!(audit[0].source, "user_promoted");
    }

    #[tokio::test]
    async fn update_title_unknown_user_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = Storage::new(tmp.path().to_str().unwrap()).await.unwrap();
        assert!(storage.update_title("nobody", "Sr", "cli").await.is_err());
    }
}
