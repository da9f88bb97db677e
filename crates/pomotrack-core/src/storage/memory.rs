//! In-memory stores for tests and throwaway runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::traits::{settings_key, SessionStore, SettingsStore, StoredSession};
use crate::error::{CoreError, Result};
use crate::timer::{CompletedSession, TimerSettings};

#[derive(Debug, Default)]
struct Inner {
    settings: HashMap<String, TimerSettings>,
    sessions: Vec<StoredSession>,
    insert_attempts: usize,
    fail_inserts: bool,
}

/// Cloneable handle; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the maps half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stored sessions, newest first.
    pub fn sessions(&self) -> Vec<StoredSession> {
        let mut out = self.lock().sessions.clone();
        out.sort_by(|a, b| b.session.completed_at.cmp(&a.session.completed_at));
        out
    }

    /// Every call to `insert`, including rejected ones.
    pub fn insert_attempts(&self) -> usize {
        self.lock().insert_attempts
    }

    /// Simulate a storage outage: subsequent inserts fail.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.lock().fail_inserts = fail;
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, project_id: Option<&str>) -> Result<Option<TimerSettings>> {
        Ok(self.lock().settings.get(settings_key(project_id)).copied())
    }

    fn put(&self, project_id: Option<&str>, settings: &TimerSettings) -> Result<()> {
        self.lock()
            .settings
            .insert(settings_key(project_id).to_string(), *settings);
        Ok(())
    }

    fn remove(&self, project_id: Option<&str>) -> Result<bool> {
        Ok(self
            .lock()
            .settings
            .remove(settings_key(project_id))
            .is_some())
    }
}

impl SessionStore for MemoryStore {
    fn insert(&self, session: &CompletedSession) -> Result<StoredSession> {
        let mut inner = self.lock();
        inner.insert_attempts += 1;
        if inner.fail_inserts {
            return Err(CoreError::Persistence {
                message: "memory store is rejecting writes".into(),
                source: None,
            });
        }
        let stored = StoredSession {
            id: Uuid::new_v4().to_string(),
            session: session.clone(),
        };
        inner.sessions.push(stored.clone());
        Ok(stored)
    }
}
