//! Recorded session commands: listing, manual entry and removal.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use pomotrack_core::storage::SessionFilter;
use pomotrack_core::{CompletedSession, CoreError, Database, SessionRecorder, SessionType};

use super::{days_before, require_project};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions, newest first
    List {
        /// Only this project
        #[arg(long)]
        project: Option<String>,
        /// Only sessions completed in the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Only this session type (focus, short, long)
        #[arg(long = "type")]
        session_type: Option<SessionType>,
        /// Maximum number of rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record a session by hand
    Add {
        /// Project ID
        project: String,
        /// Length in minutes
        #[arg(long)]
        minutes: u32,
        /// Session type (focus, short, long)
        #[arg(long = "type", default_value = "focus")]
        session_type: SessionType,
        /// Completion time as RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Free-form note
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },
}

fn parse_at(value: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::Custom(format!("invalid --at '{value}': {e}")))
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::List {
            project,
            days,
            session_type,
            limit,
        } => {
            let since = days
                .map(|d| days_before(Utc::now(), i64::from(d)))
                .transpose()?;
            let filter = SessionFilter {
                project_id: project,
                since,
                session_type,
                limit,
            };
            let sessions = db.list_sessions(&filter)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        SessionAction::Add {
            project,
            minutes,
            session_type,
            at,
            notes,
        } => {
            require_project(&db, &project)?;
            let completed_at = match at {
                Some(ref value) => parse_at(value)?,
                None => Utc::now(),
            };
            let session = CompletedSession::manual(
                project,
                session_type,
                u64::from(minutes) * 60,
                None,
                completed_at,
                notes,
            );
            let stored = SessionRecorder::new(Box::new(db)).record(&session)?;
            println!("Session recorded: {}", stored.id);
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        SessionAction::Delete { id } => {
            if !db.delete_session(&id)? {
                return Err(CoreError::NotFound { kind: "session", id }.into());
            }
            println!("Session deleted: {id}");
        }
    }
    Ok(())
}
