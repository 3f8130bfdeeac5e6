//! Event adapter between platform events and the resolver.
//!
//! This is the only module that touches host-shaped data: it resolves event
//! payloads to user records, rebuilds the rule set from configuration, runs
//! the pure resolver, and performs the single persistence step on an applied
//! decision. Configuration is reloaded from disk on every application because
//! settings are the source of truth and may change between events.

use anyhow::Result;
use log::{debug, info, warn};

use super::resolver::{resolve, TitleDecision, UserTitleContext};
use super::rules::RuleSet;
use crate::config::Config;
use crate::logutil::log_preview;
use crate::storage::{Storage, User};

/// Platform events the extension reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleEvent {
    /// Trust-level promotion; the payload identifies the user only.
    UserPromoted { user_id: u64 },
    /// A user record was saved. `primary_group_changed` reports whether the
    /// primary-group assignment was part of that save; anything else is
    /// ignored here.
    UserUpdated {
        user_id: u64,
        primary_group_changed: bool,
    },
    /// A user was added to a group. Only relevant when the group is the
    /// user's current primary group.
    GroupUserCreated { user_id: u64, group_id: u64 },
}

impl TitleEvent {
    /// Stable event-kind label used for logging and audit entries.
    pub fn kind(&self) -> &'static str {
        match self {
            TitleEvent::UserPromoted { .. } => "user_promoted",
            TitleEvent::UserUpdated { .. } => "user_updated",
            TitleEvent::GroupUserCreated { .. } => "group_user_created",
        }
    }
}

/// Running counters for the status surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// Events received.
    pub processed: u64,
    /// Events that resulted in a persisted title change.
    pub applied: u64,
    /// Events that resolved to no change.
    pub skipped: u64,
}

/// Applies title rules to users in response to events or manual runs.
pub struct TitleEngine {
    config_path: String,
    storage: Storage,
    stats: EngineStats,
}

impl TitleEngine {
    /// Build an engine rooted at the given config file. The storage location
    /// is fixed at construction; the `[titles]` section is re-read per event.
    pub async fn new(config_path: &str) -> Result<Self> {
        let config = Config::load(config_path).await?;
        let storage = Storage::new(&config.storage.data_dir).await?;
        Ok(TitleEngine {
            config_path: config_path.to_string(),
            storage,
            stats: EngineStats::default(),
        })
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Handle one platform event. Returns whether a title change was applied.
    ///
    /// A user record missing for the event's id is not an error; the event is
    /// skipped quietly, like every other form of absent input.
    pub async fn handle_event(&mut self, event: TitleEvent) -> Result<bool> {
        self.stats.processed += 1;
        let source = event.kind();

        let applied = match event {
            TitleEvent::UserPromoted { user_id } => self.apply_user_id(user_id, source).await?,
            TitleEvent::UserUpdated {
                user_id,
                primary_group_changed,
            } => {
                if primary_group_changed {
                    self.apply_user_id(user_id, source).await?
                } else {
                    false
                }
            }
            TitleEvent::GroupUserCreated { user_id, group_id } => {
                match self.storage.get_user_by_id(user_id).await? {
                    Some(user) if user.primary_group_id == Some(group_id) => {
                        self.apply_to_user(&user, source).await?
                    }
                    _ => false,
                }
            }
        };

        if applied {
            self.stats.applied += 1;
        } else {
            self.stats.skipped += 1;
        }
        Ok(applied)
    }

    async fn apply_user_id(&mut self, user_id: u64, source: &str) -> Result<bool> {
        match self.storage.get_user_by_id(user_id).await? {
            Some(user) => self.apply_to_user(&user, source).await,
            None => {
                debug!("titles: no user record for id {}", user_id);
                Ok(false)
            }
        }
    }

    /// Re-evaluate one user by name. Used by the CLI `apply` command.
    pub async fn apply_username(&mut self, username: &str, source: &str) -> Result<bool> {
        match self.storage.get_user(username).await? {
            Some(user) => self.apply_to_user(&user, source).await,
            None => {
                debug!("titles: no user record for '{}'", username);
                Ok(false)
            }
        }
    }

    /// Re-evaluate every stored user (backfill after a rule edit).
    /// Returns `(applied, total)` counts.
    pub async fn apply_all(&mut self, source: &str) -> Result<(u32, u32)> {
        let mut applied = 0;
        let mut total = 0;
        for username in self.storage.list_usernames().await? {
            total += 1;
            if self.apply_username(&username, source).await? {
                applied += 1;
            }
        }
        Ok((applied, total))
    }

    /// Run the resolver for one user and persist the outcome if it is a
    /// change. Returns whether a change was applied.
    pub async fn apply_to_user(&mut self, user: &User, source: &str) -> Result<bool> {
        // Reload settings rather than caching them; a failed reload leaves
        // this user unchanged instead of taking the event loop down.
        let titles_cfg = match Config::load(&self.config_path).await {
            Ok(config) => config.titles,
            Err(e) => {
                warn!(
                    "titles: config reload failed, leaving '{}' unchanged: {}",
                    user.username, e
                );
                return Ok(false);
            }
        };

        let rules = RuleSet::parse(&titles_cfg.rules);
        let context = UserTitleContext {
            primary_group: user.primary_group.clone(),
            trust_level: user.trust_level,
            current_title: user.title.clone(),
        };

        match resolve(&context, &rules, titles_cfg.enabled) {
            TitleDecision::NoChange => Ok(false),
            TitleDecision::SetTitle(new_title) => {
                self.storage
                    .update_title(&user.username, &new_title, source)
                    .await?;
                info!(
                    "titles: updated title for user {} to '{}'",
                    user.username,
                    log_preview(&new_title)
                );
                Ok(true)
            }
        }
    }
}
