//! Focus-time analytics over recorded sessions.
//!
//! Everything here is a pure function of a session list and a "now". Day
//! boundaries follow the time zone of `now`, so callers pass `Local::now()`
//! for calendar days as the user sees them.

mod streak;
mod summary;

pub use streak::{current_streak, focus_days};
pub use summary::{summarize, FocusSummary, ProjectBreakdown};
