use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, TimeZone};

use crate::storage::StoredSession;
use crate::timer::SessionType;

/// Calendar days (in `tz`) with at least one focus session.
pub fn focus_days<'a, Tz, I>(sessions: I, tz: &Tz) -> BTreeSet<NaiveDate>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a StoredSession>,
{
    sessions
        .into_iter()
        .filter(|s| s.session.session_type == SessionType::Focus)
        .map(|s| s.session.completed_at.with_timezone(tz).date_naive())
        .collect()
}

/// Consecutive days with a focus session, counting back from today.
///
/// A day without one ends the streak, today included: no focus session
/// today means a streak of 0.
pub fn current_streak<'a, Tz, I>(sessions: I, now: &DateTime<Tz>) -> u32
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a StoredSession>,
{
    let days = focus_days(sessions, &now.timezone());
    let mut day = now.date_naive();
    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}
