use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::project::Project;
use crate::storage::StoredSession;
use crate::timer::SessionType;

/// Focus time for one project within the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBreakdown {
    pub project_id: String,
    /// `None` when the project no longer exists.
    pub name: Option<String>,
    pub color: Option<String>,
    pub sessions: u32,
    pub total_secs: u64,
    /// Share of the window's focus time, 0.0 to 100.0.
    pub percentage: f64,
}

/// Focus totals for the last `days` calendar days (today included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSummary {
    pub days: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sessions: u32,
    pub total_secs: u64,
    pub average_secs: u64,
    /// Day of week with the most focus time; ties go to the earlier weekday.
    pub best_weekday: Option<Weekday>,
    /// Percent change against the `days` before the window; `None` when that
    /// window is empty.
    pub change_pct: Option<f64>,
    /// Ordered by focus time, largest first.
    pub by_project: Vec<ProjectBreakdown>,
}

impl FocusSummary {
    pub fn total_minutes(&self) -> u64 {
        self.total_secs / 60
    }
}

#[derive(Default)]
struct ProjectTally {
    sessions: u32,
    total_secs: u64,
}

/// Summarize focus sessions completed in the last `days` days of `now`.
///
/// `days` of 0 is treated as 1. Break sessions are ignored. `projects`
/// supplies names and colors for the breakdown.
pub fn summarize<'a, Tz, I>(
    sessions: I,
    projects: &[Project],
    days: u32,
    now: &DateTime<Tz>,
) -> FocusSummary
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a StoredSession>,
{
    let days = days.max(1);
    let tz = now.timezone();
    let to = now.date_naive();
    let from = to
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let prev_from = from
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);

    let mut count = 0u32;
    let mut total_secs = 0u64;
    let mut prev_secs = 0u64;
    let mut by_weekday: HashMap<Weekday, u64> = HashMap::new();
    let mut by_project: HashMap<&str, ProjectTally> = HashMap::new();

    for stored in sessions {
        let s = &stored.session;
        if s.session_type != SessionType::Focus {
            continue;
        }
        let day = s.completed_at.with_timezone(&tz).date_naive();
        if day >= from && day <= to {
            count += 1;
            total_secs += s.duration_secs;
            *by_weekday.entry(day.weekday()).or_default() += s.duration_secs;
            let tally = by_project.entry(s.project_id.as_str()).or_default();
            tally.sessions += 1;
            tally.total_secs += s.duration_secs;
        } else if day >= prev_from && day < from {
            prev_secs += s.duration_secs;
        }
    }

    let best_weekday = by_weekday
        .into_iter()
        .filter(|(_, secs)| *secs > 0)
        .max_by(|(a_day, a), (b_day, b)| {
            a.cmp(b)
                .then(b_day.num_days_from_monday().cmp(&a_day.num_days_from_monday()))
        })
        .map(|(day, _)| day);

    let change_pct = (prev_secs > 0)
        .then(|| (total_secs as f64 - prev_secs as f64) / prev_secs as f64 * 100.0);

    let mut breakdown: Vec<ProjectBreakdown> = by_project
        .into_iter()
        .map(|(project_id, tally)| {
            let project = projects.iter().find(|p| p.id == project_id);
            ProjectBreakdown {
                project_id: project_id.to_string(),
                name: project.map(|p| p.name.clone()),
                color: project.map(|p| p.color.clone()),
                sessions: tally.sessions,
                total_secs: tally.total_secs,
                percentage: if total_secs == 0 {
                    0.0
                } else {
                    tally.total_secs as f64 / total_secs as f64 * 100.0
                },
            }
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.total_secs
            .cmp(&a.total_secs)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });

    FocusSummary {
        days,
        from,
        to,
        sessions: count,
        total_secs,
        average_secs: if count == 0 { 0 } else { total_secs / u64::from(count) },
        best_weekday,
        change_pct,
        by_project: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::timer::CompletedSession;

    fn now() -> DateTime<Utc> {
        // A Friday.
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn session(project: &str, days_ago: i64, minutes: u64, session_type: SessionType) -> StoredSession {
        StoredSession {
            id: format!("{project}-{days_ago}-{minutes}"),
            session: CompletedSession::timed(
                project.into(),
                session_type,
                minutes * 60,
                now() - Duration::days(days_ago),
            ),
        }
    }

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.into(),
            name: name.into(),
            color: "#3b82f6".into(),
            created_at: now(),
        }
    }

    #[test]
    fn test_empty_window() {
        let summary = summarize(&Vec::<StoredSession>::new(), &[], 7, &now());
        assert_eq!(summary.sessions, 0);
        assert_eq!(summary.average_secs, 0);
        assert_eq!(summary.best_weekday, None);
        assert_eq!(summary.change_pct, None);
        assert!(summary.by_project.is_empty());
    }

    #[test]
    fn test_totals_and_breakdown() {
        let sessions = vec![
            session("a", 0, 30, SessionType::Focus),
            session("a", 1, 30, SessionType::Focus),
            session("b", 1, 20, SessionType::Focus),
            session("b", 1, 5, SessionType::ShortBreak),
            session("a", 9, 25, SessionType::Focus),
        ];
        let projects = vec![project("a", "Writing")];
        let summary = summarize(&sessions, &projects, 7, &now());

        assert_eq!(summary.from, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(summary.sessions, 3);
        assert_eq!(summary.total_minutes(), 80);
        assert_eq!(summary.average_secs, 80 * 60 / 3);

        assert_eq!(summary.by_project.len(), 2);
        let first = &summary.by_project[0];
        assert_eq!(first.project_id, "a");
        assert_eq!(first.name.as_deref(), Some("Writing"));
        assert!((first.percentage - 75.0).abs() < 1e-9);
        assert_eq!(summary.by_project[1].name, None);
    }

    #[test]
    fn test_best_weekday() {
        let sessions = vec![
            session("a", 0, 25, SessionType::Focus),
            session("a", 1, 25, SessionType::Focus),
            session("a", 1, 25, SessionType::Focus),
        ];
        let summary = summarize(&sessions, &[], 7, &now());
        assert_eq!(summary.best_weekday, Some(Weekday::Thu));
    }

    #[test]
    fn test_change_against_previous_window() {
        let sessions = vec![
            session("a", 0, 60, SessionType::Focus),
            session("a", 8, 40, SessionType::Focus),
        ];
        let summary = summarize(&sessions, &[], 7, &now());
        let change = summary.change_pct.unwrap();
        assert!((change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_days_is_today_only() {
        let sessions = vec![
            session("a", 0, 25, SessionType::Focus),
            session("a", 1, 25, SessionType::Focus),
        ];
        let summary = summarize(&sessions, &[], 0, &now());
        assert_eq!(summary.days, 1);
        assert_eq!(summary.sessions, 1);
        assert_eq!(summary.change_pct, Some(0.0));
    }

    #[test]
    fn test_serialization() {
        let sessions = vec![session("a", 0, 25, SessionType::Focus)];
        let summary = summarize(&sessions, &[], 7, &now());
        let json = serde_json::to_string(&summary).unwrap();
        let back: FocusSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
