mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DayTypeConfig, FocusGoalConfig, ImportConfig, LevelConfig, RewardSettings};
pub use database::{Database, NewTimer, TimerRecord, WalletRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/medalroom[-dev]/` based on MEDALROOM_ENV.
///
/// Set MEDALROOM_ENV=dev to use the development data directory, or
/// MEDALROOM_HOME to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("MEDALROOM_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MEDALROOM_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("medalroom-dev")
            } else {
                base_dir.join("medalroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
