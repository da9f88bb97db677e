use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timer::{CompletedSession, TimerSettings};

/// Row key used for settings that are not bound to a project.
pub const GLOBAL_SETTINGS_KEY: &str = "__global__";

pub(crate) fn settings_key(project_id: Option<&str>) -> &str {
    project_id.unwrap_or(GLOBAL_SETTINGS_KEY)
}

/// A session after the store accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: String,
    #[serde(flatten)]
    pub session: CompletedSession,
}

/// Persistent timer settings, keyed by project (`None` is the global row).
pub trait SettingsStore: Send {
    fn get(&self, project_id: Option<&str>) -> Result<Option<TimerSettings>>;

    fn put(&self, project_id: Option<&str>, settings: &TimerSettings) -> Result<()>;

    /// Delete a row. Returns whether one existed.
    fn remove(&self, project_id: Option<&str>) -> Result<bool>;
}

/// Append-only history of completed sessions.
pub trait SessionStore: Send {
    fn insert(&self, session: &CompletedSession) -> Result<StoredSession>;
}
