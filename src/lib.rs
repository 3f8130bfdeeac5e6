//! # Grouptitles - Group-Based Display Titles for Forum Users
//!
//! Grouptitles is a small extension for forum platforms that automatically assigns a
//! display title to a user from the user's primary group membership and numeric trust
//! level. It reacts to three platform events (user promoted, user updated, user added
//! to a group), matches the user's primary group against a configured rule set, and
//! updates the stored title only when the resolved title actually differs.
//!
//! ## Features
//!
//! - **Rule-Driven Titles**: One pipe-delimited line per group maps trust levels 1-4 to titles.
//! - **Pure Resolution Core**: The resolver is a side-effect-free function; persistence and
//!   logging happen only in the event adapter, on an applied change.
//! - **Fail-Quiet Configuration**: Malformed rules and missing data degrade to "no change",
//!   never to an error that stalls event processing for other users.
//! - **Audit Trail**: Every applied title change is appended to a JSON-lines audit log.
//! - **User Storage**: JSON-per-user records with exclusive-lock atomic writes.
//! - **Async Design**: Built with Tokio; events drain through an in-process dispatcher task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grouptitles::titles::{start_dispatcher, TitleEngine, TitleEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // The engine reloads `config.toml` on every event, so rule edits
//!     // take effect without a restart.
//!     let engine = TitleEngine::new("config.toml").await?;
//!     let dispatcher = start_dispatcher(engine);
//!
//!     dispatcher.publish(TitleEvent::UserPromoted { user_id: 42 });
//!     dispatcher.shutdown().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`titles`] - Rule parsing, title resolution, event adapter and dispatcher
//! - [`storage`] - User record and audit log persistence layer
//! - [`config`] - Configuration management
//! - [`validation`] - Storage safety helpers (filenames, size caps, guarded JSON)
//! - [`logutil`] - Log sanitization for configuration-sourced strings

pub mod config;
pub mod logutil;
pub mod storage;
pub mod titles;
pub mod validation;
