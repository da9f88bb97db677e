mod config;
pub mod database;
mod memory;
pub mod migrations;
mod traits;

pub use config::{Config, LogConfig, NotificationsConfig, TimerConfig, CONFIG_FILE};
pub use database::{Database, SessionFilter, DB_FILE};
pub use memory::MemoryStore;
pub use traits::{SessionStore, SettingsStore, StoredSession, GLOBAL_SETTINGS_KEY};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `POMOTRACK_HOME` wins when set. Otherwise `~/.config/pomotrack`, or
/// `~/.config/pomotrack-dev` when `POMOTRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOTRACK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotrack-dev")
            } else {
                base_dir.join("pomotrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
