//! # Titles Module - Group-Based Title Assignment
//!
//! Everything specific to automatic titles lives here, split along the
//! pure/impure boundary:
//!
//! - [`rules`] - Rule and rule-set parsing from pipe-delimited config lines
//! - [`resolver`] - The pure lookup-and-compare resolution function
//! - [`engine`] - Event adapter: loads users and config, persists applied changes
//! - [`dispatch`] - In-process event dispatcher task feeding the engine
//!
//! ## Event Flow
//!
//! ```text
//! platform event ──▶ DispatcherHandle::publish
//!                        │
//!                ┌───────────────┐
//!                │  TitleEngine  │ ← reloads [titles] config per event
//!                └───────────────┘
//!                        │
//!                 resolve(context, rules, enabled)
//!                        │
//!            NoChange ───┴─── SetTitle ──▶ Storage::update_title + audit + log
//! ```

pub mod dispatch;
pub mod engine;
pub mod resolver;
pub mod rules;

pub use dispatch::{start_dispatcher, DispatcherHandle};
pub use engine::{EngineStats, TitleEngine, TitleEvent};
pub use resolver::{resolve, TitleDecision, UserTitleContext};
pub use rules::{Rule, RuleSet};
