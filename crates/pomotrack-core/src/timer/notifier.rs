//! Holds the single "session complete" prompt shown to the user.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::engine::{Completion, TimerEngine};
use super::session::SessionType;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// What the completion dialog displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCompletion {
    pub session_type: SessionType,
    pub next_session_type: SessionType,
    pub completed_focus_count: u64,
}

impl From<&Completion> for PendingCompletion {
    fn from(c: &Completion) -> Self {
        Self {
            session_type: c.finished,
            next_session_type: c.next,
            completed_focus_count: c.completed_focus_count,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompletionNotifier {
    pending: Option<PendingCompletion>,
}

impl CompletionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingCompletion> {
        self.pending.as_ref()
    }

    /// Queue a completion for the user.
    ///
    /// # Errors
    /// Returns [`CoreError::CompletionPending`] if an earlier completion has
    /// not been acknowledged; the earlier one is kept.
    pub fn raise(&mut self, completion: PendingCompletion) -> Result<()> {
        if self.pending.is_some() {
            return Err(CoreError::CompletionPending);
        }
        self.pending = Some(completion);
        Ok(())
    }

    /// Close the prompt without advancing the timer.
    pub fn dismiss(&mut self) -> Option<Event> {
        self.pending
            .take()
            .map(|_| Event::CompletionDismissed { at: Utc::now() })
    }

    /// Start the suggested next interval and close the prompt.
    pub fn accept_and_start_next(&mut self, engine: &mut TimerEngine) -> Option<Event> {
        let pending = self.pending?;
        let event = engine.start_next(pending.next_session_type);
        self.pending = None;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerSettings;

    fn pending(next: SessionType) -> PendingCompletion {
        PendingCompletion {
            session_type: SessionType::Focus,
            next_session_type: next,
            completed_focus_count: 1,
        }
    }

    #[test]
    fn raise_refuses_to_overwrite() {
        let mut n = CompletionNotifier::new();
        n.raise(pending(SessionType::ShortBreak)).unwrap();
        let err = n.raise(pending(SessionType::LongBreak)).unwrap_err();
        assert!(matches!(err, CoreError::CompletionPending));
        assert_eq!(
            n.pending().map(|p| p.next_session_type),
            Some(SessionType::ShortBreak)
        );
    }

    #[test]
    fn dismiss_clears_without_advancing() {
        let mut engine = TimerEngine::new(TimerSettings::default(), None);
        let mut n = CompletionNotifier::new();
        n.raise(pending(SessionType::ShortBreak)).unwrap();
        assert!(n.dismiss().is_some());
        assert!(n.pending().is_none());
        assert!(n.dismiss().is_none());
        assert_eq!(engine.session_type(), SessionType::Focus);
        assert!(n.accept_and_start_next(&mut engine).is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn accept_starts_next_interval() {
        let mut engine = TimerEngine::new(TimerSettings::default(), None);
        let mut n = CompletionNotifier::new();
        n.raise(pending(SessionType::LongBreak)).unwrap();
        assert!(n.accept_and_start_next(&mut engine).is_some());
        assert!(n.pending().is_none());
        assert_eq!(engine.session_type(), SessionType::LongBreak);
        assert_eq!(engine.time_left(), 15 * 60);
        assert!(engine.is_running());
    }
}
