use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Project identifier as stored by the session and settings stores.
pub type ProjectId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Focus,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    /// Token used in storage and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Focus => "focus",
            SessionType::ShortBreak => "shortBreak",
            SessionType::LongBreak => "longBreak",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Focus => "Focus Time",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Focus)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "focus" => Ok(SessionType::Focus),
            "short" | "shortBreak" | "short-break" | "short_break" => Ok(SessionType::ShortBreak),
            "long" | "longBreak" | "long-break" | "long_break" => Ok(SessionType::LongBreak),
            other => Err(ValidationError::UnknownSessionType(other.to_string())),
        }
    }
}

pub const DEFAULT_FOCUS_MIN: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MIN: u32 = 5;
pub const DEFAULT_LONG_BREAK_MIN: u32 = 15;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Effective timer durations for one project (or the global scope).
///
/// Durations are minutes; `long_break_interval` counts focus sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus_duration: u32,
    pub short_break_duration: u32,
    pub long_break_duration: u32,
    pub long_break_interval: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_duration: DEFAULT_FOCUS_MIN,
            short_break_duration: DEFAULT_SHORT_BREAK_MIN,
            long_break_duration: DEFAULT_LONG_BREAK_MIN,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
        }
    }
}

impl TimerSettings {
    /// Build settings from user input, rejecting non-positive values.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidSettings`] naming the first bad field.
    pub fn new(
        focus_duration: i64,
        short_break_duration: i64,
        long_break_duration: i64,
        long_break_interval: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            focus_duration: positive("focus_duration", focus_duration)?,
            short_break_duration: positive("short_break_duration", short_break_duration)?,
            long_break_duration: positive("long_break_duration", long_break_duration)?,
            long_break_interval: positive("long_break_interval", long_break_interval)?,
        })
    }

    /// Lenient construction from stored values: any field that is not a
    /// positive integer falls back to its default.
    pub fn from_raw(
        focus_duration: i64,
        short_break_duration: i64,
        long_break_duration: i64,
        long_break_interval: i64,
    ) -> Self {
        let defaults = Self::default();
        Self {
            focus_duration: positive("focus_duration", focus_duration)
                .unwrap_or(defaults.focus_duration),
            short_break_duration: positive("short_break_duration", short_break_duration)
                .unwrap_or(defaults.short_break_duration),
            long_break_duration: positive("long_break_duration", long_break_duration)
                .unwrap_or(defaults.long_break_duration),
            long_break_interval: positive("long_break_interval", long_break_interval)
                .unwrap_or(defaults.long_break_interval),
        }
    }

    /// Replace zero fields with defaults.
    pub fn normalized(self) -> Self {
        Self::from_raw(
            self.focus_duration as i64,
            self.short_break_duration as i64,
            self.long_break_duration as i64,
            self.long_break_interval as i64,
        )
    }

    pub fn is_valid(&self) -> bool {
        *self == self.normalized()
    }

    /// Full length of an interval of `session_type`, in seconds.
    pub fn duration_secs(&self, session_type: SessionType) -> u64 {
        let minutes = match session_type {
            SessionType::Focus => self.focus_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        };
        u64::from(minutes).saturating_mul(60)
    }

    /// The break that follows the `completed_focus_count`-th focus session.
    ///
    /// A zero interval is treated as the default so the modulo is defined.
    pub fn break_after(&self, completed_focus_count: u64) -> SessionType {
        let interval = match self.long_break_interval {
            0 => u64::from(DEFAULT_LONG_BREAK_INTERVAL),
            n => u64::from(n),
        };
        if completed_focus_count % interval == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        }
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ValidationError::InvalidSettings { field, value }),
    }
}

/// A finished interval on its way to the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub project_id: ProjectId,
    pub session_type: SessionType,
    /// Seconds.
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub is_manual: bool,
    pub notes: Option<String>,
}

impl CompletedSession {
    /// An automatically timed session. `started_at` is derived from the
    /// nominal duration rather than measured.
    pub fn timed(
        project_id: ProjectId,
        session_type: SessionType,
        duration_secs: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            session_type,
            duration_secs,
            started_at: derive_started_at(completed_at, duration_secs),
            completed_at,
            is_manual: false,
            notes: None,
        }
    }

    /// A session entered by hand after the fact.
    pub fn manual(
        project_id: ProjectId,
        session_type: SessionType,
        duration_secs: u64,
        started_at: Option<DateTime<Utc>>,
        completed_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            project_id,
            session_type,
            duration_secs,
            started_at: started_at
                .unwrap_or_else(|| derive_started_at(completed_at, duration_secs)),
            completed_at,
            is_manual: true,
            notes,
        }
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_secs as f64 / 60.0
    }
}

fn derive_started_at(completed_at: DateTime<Utc>, duration_secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(duration_secs).unwrap_or(i64::MAX);
    completed_at
        .checked_sub_signed(Duration::seconds(secs))
        .unwrap_or(completed_at)
}

/// Format seconds as `MM:SS`; minutes are not wrapped into hours.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
