mod engine;
mod notifier;
mod session;
mod ticker;

pub use engine::{Completion, TimerEngine, TimerState};
pub use notifier::{CompletionNotifier, PendingCompletion};
pub use session::{
    format_mm_ss, CompletedSession, ProjectId, SessionType, TimerSettings,
    DEFAULT_FOCUS_MIN, DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_LONG_BREAK_MIN,
    DEFAULT_SHORT_BREAK_MIN,
};
pub use ticker::{Ticker, DEFAULT_TICK, MIN_TICK};
