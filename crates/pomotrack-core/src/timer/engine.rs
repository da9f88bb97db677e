//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not own a
//! thread or a timer; the caller invokes `tick()` once per elapsed second
//! (see [`super::Ticker`] and [`crate::service::TimerService`]).
//!
//! ## State Transitions
//!
//! ```text
//! (Focus | ShortBreak | LongBreak) x (running | paused)
//!
//! start/pause     toggle running, keep type and time_left
//! reset/switch    pause, reload the full duration
//! tick to zero    pause, time_left = 0, return Completion{next}
//! start_next      set type = next, reload, running
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default(), Some(project_id));
//! engine.start();
//! // once per second:
//! if let Some(done) = engine.tick() {
//!     // hand done.session to the recorder, ask the user, then:
//!     engine.start_next(done.next);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::session::{CompletedSession, ProjectId, SessionType, TimerSettings};
use crate::events::Event;

/// Observable state of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Seconds remaining in the current interval.
    pub time_left: u64,
    pub session_type: SessionType,
    pub is_running: bool,
    pub current_project_id: Option<ProjectId>,
    /// Completed focus intervals since this engine was created.
    pub completed_focus_count: u64,
}

/// Result of an interval running out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub finished: SessionType,
    pub next: SessionType,
    pub completed_focus_count: u64,
    /// Present only for focus intervals with a bound project.
    pub session: Option<CompletedSession>,
    pub at: DateTime<Utc>,
}

impl Completion {
    pub fn event(&self) -> Event {
        Event::TimerCompleted {
            session_type: self.finished,
            next_session_type: self.next,
            completed_focus_count: self.completed_focus_count,
            at: self.at,
        }
    }
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    settings: TimerSettings,
    state: TimerState,
}

impl TimerEngine {
    /// Create a paused focus interval sized from `settings`.
    pub fn new(settings: TimerSettings, project_id: Option<ProjectId>) -> Self {
        let settings = settings.normalized();
        Self {
            state: TimerState {
                time_left: settings.duration_secs(SessionType::Focus),
                session_type: SessionType::Focus,
                is_running: false,
                current_project_id: project_id,
                completed_focus_count: 0,
            },
            settings,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn time_left(&self) -> u64 {
        self.state.time_left
    }

    pub fn session_type(&self) -> SessionType {
        self.state.session_type
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn current_project_id(&self) -> Option<&str> {
        self.state.current_project_id.as_deref()
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.state.completed_focus_count
    }

    /// Full length of the current interval in seconds.
    pub fn total_secs(&self) -> u64 {
        self.settings.duration_secs(self.state.session_type)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            session_type: self.state.session_type,
            time_left: self.state.time_left,
            total_secs: self.total_secs(),
            is_running: self.state.is_running,
            current_project_id: self.state.current_project_id.clone(),
            completed_focus_count: self.state.completed_focus_count,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down. No-op while already running.
    ///
    /// An exhausted interval (left at zero after a dismissed completion)
    /// restarts from its full duration so it cannot complete twice.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        if self.state.time_left == 0 {
            self.state.time_left = self.total_secs();
        }
        self.state.is_running = true;
        debug!(session_type = %self.state.session_type, time_left = self.state.time_left, "timer started");
        Some(Event::TimerStarted {
            session_type: self.state.session_type,
            time_left: self.state.time_left,
            at: Utc::now(),
        })
    }

    /// Stop counting down, keeping the remaining time. No-op while paused.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        debug!(time_left = self.state.time_left, "timer paused");
        Some(Event::TimerPaused {
            session_type: self.state.session_type,
            time_left: self.state.time_left,
            at: Utc::now(),
        })
    }

    /// Pause and reload the full duration of the current session type.
    pub fn reset(&mut self) -> Option<Event> {
        self.state.is_running = false;
        self.state.time_left = self.total_secs();
        Some(Event::TimerReset {
            session_type: self.state.session_type,
            time_left: self.state.time_left,
            at: Utc::now(),
        })
    }

    /// User-initiated jump to another session type. Never records a
    /// session and never touches the focus counter.
    pub fn switch_session(&mut self, session_type: SessionType) -> Option<Event> {
        let from = self.state.session_type;
        self.state.is_running = false;
        self.state.session_type = session_type;
        self.state.time_left = self.total_secs();
        debug!(%from, to = %session_type, "session switched");
        Some(Event::SessionSwitched {
            from,
            to: session_type,
            time_left: self.state.time_left,
            at: Utc::now(),
        })
    }

    /// Rebind the project without touching the countdown.
    pub fn set_current_project(&mut self, project_id: Option<ProjectId>) -> Option<Event> {
        if self.state.current_project_id == project_id {
            return None;
        }
        self.state.current_project_id = project_id;
        Some(Event::ProjectChanged {
            project_id: self.state.current_project_id.clone(),
            at: Utc::now(),
        })
    }

    /// Adopt newly resolved settings.
    ///
    /// A paused interval is resized immediately; a running one keeps its
    /// countdown and picks the new durations up at the next boundary.
    /// `long_break_interval` always applies from the next completion.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        let settings = settings.normalized();
        if settings == self.settings {
            return None;
        }
        let durations_changed = SessionType::ALL
            .iter()
            .any(|t| settings.duration_secs(*t) != self.settings.duration_secs(*t));
        self.settings = settings;

        let mut time_left_changed = false;
        if durations_changed && !self.state.is_running {
            let full = self.total_secs();
            time_left_changed = full != self.state.time_left;
            self.state.time_left = full;
        }
        Some(Event::SettingsApplied {
            settings,
            time_left_changed,
            at: Utc::now(),
        })
    }

    /// One elapsed second. Returns the completion when the interval ends.
    pub fn tick(&mut self) -> Option<Completion> {
        self.tick_at(Utc::now())
    }

    /// [`tick`](Self::tick) with an explicit wall-clock time for the
    /// completion timestamps.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> Option<Completion> {
        if !self.state.is_running {
            return None;
        }
        if self.state.time_left > 1 {
            self.state.time_left -= 1;
            return None;
        }
        Some(self.complete_interval(now))
    }

    /// Advance to `next` and resume counting in one step.
    pub fn start_next(&mut self, next: SessionType) -> Option<Event> {
        self.state.session_type = next;
        self.state.time_left = self.total_secs();
        self.state.is_running = true;
        debug!(session_type = %next, time_left = self.state.time_left, "next session started");
        Some(Event::TimerStarted {
            session_type: next,
            time_left: self.state.time_left,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_interval(&mut self, at: DateTime<Utc>) -> Completion {
        let finished = self.state.session_type;

        let session = match (finished, &self.state.current_project_id) {
            (SessionType::Focus, Some(project_id)) => Some(CompletedSession::timed(
                project_id.clone(),
                finished,
                self.settings.duration_secs(finished),
                at,
            )),
            (SessionType::Focus, None) => {
                debug!("focus interval completed without a project; nothing to record");
                None
            }
            _ => None,
        };

        let next = if finished == SessionType::Focus {
            self.state.completed_focus_count += 1;
            self.settings.break_after(self.state.completed_focus_count)
        } else {
            SessionType::Focus
        };

        self.state.time_left = 0;
        self.state.is_running = false;

        info!(
            %finished,
            %next,
            completed_focus_count = self.state.completed_focus_count,
            "interval completed"
        );

        Completion {
            finished,
            next,
            completed_focus_count: self.state.completed_focus_count,
            session,
            at,
        }
    }
}
