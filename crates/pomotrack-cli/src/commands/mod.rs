pub mod config;
pub mod project;
pub mod session;
pub mod settings;
pub mod stats;
pub mod timer;

use chrono::{DateTime, Duration, Utc};
use pomotrack_core::{CoreError, Database};

/// Fail with a not-found error unless `id` names a stored project.
pub(crate) fn require_project(db: &Database, id: &str) -> Result<(), CoreError> {
    match db.get_project(id)? {
        Some(_) => Ok(()),
        None => Err(CoreError::NotFound {
            kind: "project",
            id: id.to_string(),
        }),
    }
}

/// `now` minus `days` whole days, or an error when that falls outside the
/// representable date range.
pub(crate) fn days_before(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, CoreError> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| CoreError::Custom("--days reaches past the supported date range".into()))
}
