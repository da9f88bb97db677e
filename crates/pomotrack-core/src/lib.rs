//! # Pomotrack Core Library
//!
//! Core logic for the Pomotrack Pomodoro timer: a countdown state machine
//! that moves between focus and break intervals, per-project settings, and
//! a pipeline that records each completed focus interval exactly once.
//! The `pomotrack` CLI is a thin shell over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A synchronous state machine. The caller drives it by
//!   invoking `tick()` once per period
//! - **Timer Service**: Owns the engine, a tokio tick task, the completion
//!   prompt and the recorder worker; broadcasts [`Event`]s
//! - **Storage**: SQLite-backed projects, sessions and settings, plus
//!   TOML-based configuration
//! - **Stats**: Totals, streaks and project breakdowns over recorded sessions
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`]: Running timer with tick source and recording
//! - [`SettingsResolver`]: Stored settings for a project or the global scope, else defaults
//! - [`SessionRecorder`]: Validated session persistence
//! - [`Database`]: SQLite store implementing [`SettingsStore`] and [`SessionStore`]
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod project;
pub mod recorder;
pub mod service;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use project::Project;
pub use recorder::SessionRecorder;
pub use service::{ServiceOptions, TimerService};
pub use settings::SettingsResolver;
pub use storage::{Config, Database, MemoryStore, SessionStore, SettingsStore, StoredSession};
pub use timer::{
    CompletedSession, CompletionNotifier, ProjectId, SessionType, TimerEngine, TimerSettings,
    TimerState,
};
