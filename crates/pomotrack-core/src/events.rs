use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ProjectId, SessionType, TimerSettings};

/// Every state change in the timer produces an Event.
/// The shell renders them; the service broadcasts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        time_left: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_type: SessionType,
        time_left: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        session_type: SessionType,
        time_left: u64,
        at: DateTime<Utc>,
    },
    SessionSwitched {
        from: SessionType,
        to: SessionType,
        time_left: u64,
        at: DateTime<Utc>,
    },
    ProjectChanged {
        project_id: Option<ProjectId>,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        settings: TimerSettings,
        /// Whether the visible countdown was re-derived.
        time_left_changed: bool,
        at: DateTime<Utc>,
    },
    /// An interval ran out. The engine is paused until the next one is started.
    TimerCompleted {
        session_type: SessionType,
        next_session_type: SessionType,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
    /// The pending completion was acknowledged without starting the next interval.
    CompletionDismissed {
        at: DateTime<Utc>,
    },
    /// Countdown advanced by one second. Only broadcast, never returned by commands.
    Tick {
        time_left: u64,
    },
    SessionRecorded {
        session_id: String,
        project_id: ProjectId,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionRecordFailed {
        project_id: ProjectId,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_type: SessionType,
        time_left: u64,
        total_secs: u64,
        is_running: bool,
        current_project_id: Option<ProjectId>,
        completed_focus_count: u64,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_snake_case() {
        let ev = Event::TimerCompleted {
            session_type: SessionType::Focus,
            next_session_type: SessionType::ShortBreak,
            completed_focus_count: 1,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "timer_completed");
        assert_eq!(json["next_session_type"], "shortBreak");
    }
}
