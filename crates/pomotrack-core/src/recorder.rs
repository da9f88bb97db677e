//! Persists completed sessions without ever blocking the timer.
//!
//! [`SessionRecorder::record`] is the synchronous contract. The timer
//! service reaches it through [`spawn_worker`], which drains a channel on a
//! separate task and reports each outcome as an [`Event`].

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::storage::{SessionStore, StoredSession};
use crate::timer::CompletedSession;

pub struct SessionRecorder {
    store: Box<dyn SessionStore>,
}

impl SessionRecorder {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Validate and store one session.
    ///
    /// # Errors
    /// [`ValidationError::MissingProject`] or [`ValidationError::InvalidValue`]
    /// for malformed input; [`CoreError::Persistence`] when the store fails.
    pub fn record(&self, session: &CompletedSession) -> Result<StoredSession> {
        validate(session)?;
        let stored = self.store.insert(session).map_err(|e| match e {
            CoreError::Persistence { .. } => e,
            other => CoreError::persistence(other),
        })?;
        info!(
            session_id = %stored.id,
            project_id = %session.project_id,
            session_type = %session.session_type,
            duration_secs = session.duration_secs,
            manual = session.is_manual,
            "session recorded"
        );
        Ok(stored)
    }
}

fn validate(session: &CompletedSession) -> Result<()> {
    if session.project_id.trim().is_empty() {
        return Err(ValidationError::MissingProject.into());
    }
    if session.duration_secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "duration_secs".into(),
            message: "must be greater than zero".into(),
        }
        .into());
    }
    if session.started_at > session.completed_at {
        return Err(ValidationError::InvalidValue {
            field: "started_at".into(),
            message: "must not be after completed_at".into(),
        }
        .into());
    }
    Ok(())
}

/// Run `recorder` on its own task. Sessions sent on the returned channel
/// are stored in order; results go out on `events`. The task ends once
/// every sender is dropped and the queue is drained.
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker(
    recorder: SessionRecorder,
    events: broadcast::Sender<Event>,
) -> (mpsc::UnboundedSender<CompletedSession>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<CompletedSession>();
    let recorder = Arc::new(Mutex::new(recorder));

    let handle = tokio::spawn(async move {
        while let Some(session) = rx.recv().await {
            let project_id = session.project_id.clone();
            let duration_secs = session.duration_secs;
            let rec = recorder.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let rec = rec.lock().unwrap_or_else(|e| e.into_inner());
                rec.record(&session)
            })
            .await
            .unwrap_or_else(|join_err| Err(CoreError::Custom(join_err.to_string())));

            let event = match outcome {
                Ok(stored) => Event::SessionRecorded {
                    session_id: stored.id,
                    project_id,
                    duration_secs,
                    at: Utc::now(),
                },
                Err(e) => {
                    warn!(%project_id, error = %e, "failed to record session");
                    Event::SessionRecordFailed {
                        project_id,
                        message: e.to_string(),
                        at: Utc::now(),
                    }
                }
            };
            // No subscribers is fine.
            let _ = events.send(event);
        }
    });

    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::SessionType;

    fn focus(project: &str, secs: u64) -> CompletedSession {
        CompletedSession::timed(project.into(), SessionType::Focus, secs, Utc::now())
    }

    #[test]
    fn record_stores_valid_sessions() {
        let store = MemoryStore::new();
        let recorder = SessionRecorder::new(Box::new(store.clone()));
        let stored = recorder.record(&focus("p", 60)).unwrap();
        assert_eq!(store.sessions(), vec![stored]);
    }

    #[test]
    fn record_validates_before_touching_store() {
        let store = MemoryStore::new();
        let recorder = SessionRecorder::new(Box::new(store.clone()));
        assert!(matches!(
            recorder.record(&focus("  ", 60)),
            Err(CoreError::Validation(ValidationError::MissingProject))
        ));
        assert!(matches!(
            recorder.record(&focus("p", 0)),
            Err(CoreError::Validation(ValidationError::InvalidValue { .. }))
        ));
        assert_eq!(store.insert_attempts(), 0);
    }

    #[test]
    fn store_failure_is_a_persistence_error() {
        let store = MemoryStore::new();
        store.set_fail_inserts(true);
        let recorder = SessionRecorder::new(Box::new(store));
        assert!(matches!(
            recorder.record(&focus("p", 60)),
            Err(CoreError::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn worker_reports_outcomes_in_order() {
        let store = MemoryStore::new();
        let (events, mut rx) = broadcast::channel(16);
        let (tx, handle) = spawn_worker(SessionRecorder::new(Box::new(store.clone())), events);

        tx.send(focus("p", 60)).unwrap();
        tx.send(focus("", 60)).unwrap();
        drop(tx);
        handle.await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), Event::SessionRecorded { .. }));
        assert!(matches!(
            rx.recv().await.unwrap(),
            Event::SessionRecordFailed { .. }
        ));
        assert_eq!(store.sessions().len(), 1);
    }
}
