use chrono::{Local, Utc};
use clap::Subcommand;
use pomotrack_core::stats::{current_streak, summarize};
use pomotrack_core::storage::SessionFilter;
use pomotrack_core::{Database, SessionType};
use serde_json::json;

use super::days_before;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Focus totals for the last N days
    Summary {
        /// Window length in days
        #[arg(long, default_value = "7")]
        days: u32,
        /// Only this project
        #[arg(long)]
        project: Option<String>,
    },
    /// Consecutive days with focus time, ending today
    Streak,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Local::now();

    match action {
        StatsAction::Summary { days, project } => {
            // Two windows plus a day of slack for time zone offsets.
            let lookback = i64::from(days.max(1)) * 2 + 1;
            let since = days_before(Utc::now(), lookback)?;
            let sessions = db.list_sessions(&SessionFilter {
                project_id: project,
                since: Some(since),
                session_type: Some(SessionType::Focus),
                limit: None,
            })?;
            let projects = db.list_projects()?;
            let summary = summarize(&sessions, &projects, days, &now);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::Streak => {
            let sessions = db.list_sessions(&SessionFilter {
                session_type: Some(SessionType::Focus),
                ..SessionFilter::default()
            })?;
            let out = json!({
                "date": now.date_naive(),
                "streak_days": current_streak(&sessions, &now),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
