//! # Medalroom Core Library
//!
//! This library provides the reward logic behind medalroom: focused time
//! earns medals according to configurable goals, each day's earnings are kept
//! as a snapshot, and a wallet holds the all-time totals. The CLI binary is a
//! thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Rewards**: evaluation, per-day reconciliation, the wallet and the rest
//!   time display
//! - **Storage**: SQLite-based timer and reward storage and TOML-based
//!   configuration
//! - **Import**: timers from Super Productivity exports and backups
//! - **Stats**: levels and per-day history
//!
//! ## Key Components
//!
//! - [`reconcile_range`]: reconcile dates and commit the wallet once
//! - [`compute_display`]: goal progress and nearest rest time
//! - [`Database`]: timer, snapshot and wallet persistence
//! - [`Config`]: reward configuration management

pub mod error;
pub mod goals;
pub mod import;
pub mod medal;
pub mod rewards;
pub mod stats;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, ImportError, ValidationError};
pub use goals::{Calendar, DayType, FocusGoal};
pub use import::{import_file, newest_json_in, AutoImport, ImportSource, ImportSummary, Trigger};
pub use medal::{Medal, MedalCounts, MedalDelta};
pub use rewards::{
    compute_display, evaluate, reconcile_day, reconcile_range, BatchReport, DayOutcome, FocusTimeSource,
    RestDisplay, RewardStore,
};
pub use stats::{current_level, daily_history, day_status, DayStatus, Level};
pub use storage::{Config, Database, NewTimer, RewardSettings, TimerRecord, WalletRecord};
