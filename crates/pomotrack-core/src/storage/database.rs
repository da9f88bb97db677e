//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Projects
//! - Completed and manually entered sessions
//! - Per-project timer settings

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use super::traits::{settings_key, SessionStore, SettingsStore, StoredSession};
use crate::error::{CoreError, DatabaseError, Result};
use crate::project::Project;
use crate::timer::{CompletedSession, SessionType, TimerSettings};

pub const DB_FILE: &str = "pomotrack.db";

/// Which sessions `list_sessions` returns.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub project_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub session_type: Option<SessionType>,
    pub limit: Option<usize>,
}

/// SQLite database for projects, sessions and settings.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/pomotrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(DB_FILE);
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "database opened");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Projects ─────────────────────────────────────────────────────

    pub fn create_project(&self, project: &Project) -> Result<()> {
        self.conn.execute(
            "INSERT INTO projects (id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id,
                project.name,
                project.color,
                fmt_ts(project.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, color, created_at FROM projects WHERE id = ?1",
                params![id],
                project_columns,
            )
            .optional()?;
        row.map(project_from_columns).transpose()
    }

    /// All projects, sorted by name.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at FROM projects ORDER BY name COLLATE NOCASE, id",
        )?;
        let rows = stmt.query_map([], project_columns)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(project_from_columns(row?)?);
        }
        Ok(out)
    }

    /// Update name and/or color. Returns the updated project.
    pub fn update_project(
        &self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Project> {
        let mut project = self.get_project(id)?.ok_or_else(|| CoreError::NotFound {
            kind: "project",
            id: id.to_string(),
        })?;
        if let Some(name) = name {
            project.name = crate::project::validate_name(name)?;
        }
        if let Some(color) = color {
            project.color = crate::project::validate_color(color)?;
        }
        self.conn.execute(
            "UPDATE projects SET name = ?2, color = ?3 WHERE id = ?1",
            params![project.id, project.name, project.color],
        )?;
        Ok(project)
    }

    /// Delete a project together with its sessions and settings.
    /// Returns false if no such project existed.
    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        if removed > 0 {
            tx.execute("DELETE FROM sessions WHERE project_id = ?1", params![id])?;
            tx.execute("DELETE FROM project_settings WHERE scope = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Sessions matching `filter`, newest first.
    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<StoredSession>> {
        let mut sql = String::from(
            "SELECT id, project_id, session_type, duration_secs, started_at, completed_at, is_manual, notes
             FROM sessions WHERE 1 = 1",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(ref project_id) = filter.project_id {
            args.push(project_id.clone());
            sql.push_str(&format!(" AND project_id = ?{}", args.len()));
        }
        if let Some(since) = filter.since {
            args.push(fmt_ts(since));
            sql.push_str(&format!(" AND completed_at >= ?{}", args.len()));
        }
        if let Some(session_type) = filter.session_type {
            args.push(session_type.as_str().to_string());
            sql.push_str(&format!(" AND session_type = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY completed_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(SessionColumns {
                id: row.get(0)?,
                project_id: row.get(1)?,
                session_type: row.get(2)?,
                duration_secs: row.get(3)?,
                started_at: row.get(4)?,
                completed_at: row.get(5)?,
                is_manual: row.get::<_, i64>(6)? != 0,
                notes: row.get(7)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

type ProjectColumns = (String, String, String, String);

fn project_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn project_from_columns((id, name, color, created_at): ProjectColumns) -> Result<Project> {
    Ok(Project {
        id,
        name,
        color,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

struct SessionColumns {
    id: String,
    project_id: String,
    session_type: String,
    duration_secs: i64,
    started_at: String,
    completed_at: String,
    is_manual: bool,
    notes: Option<String>,
}

impl SessionColumns {
    fn decode(self) -> Result<StoredSession> {
        let session_type = self
            .session_type
            .parse::<SessionType>()
            .map_err(|_| DatabaseError::Corrupt {
                column: "session_type",
                value: self.session_type.clone(),
            })?;
        let duration_secs =
            u64::try_from(self.duration_secs).map_err(|_| DatabaseError::Corrupt {
                column: "duration_secs",
                value: self.duration_secs.to_string(),
            })?;
        Ok(StoredSession {
            id: self.id,
            session: CompletedSession {
                project_id: self.project_id,
                session_type,
                duration_secs,
                started_at: parse_ts("started_at", &self.started_at)?,
                completed_at: parse_ts("completed_at", &self.completed_at)?,
                is_manual: self.is_manual,
                notes: self.notes,
            },
        })
    }
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DatabaseError::Corrupt {
                column,
                value: value.to_string(),
            }
            .into()
        })
}

impl SettingsStore for Database {
    fn get(&self, project_id: Option<&str>) -> Result<Option<TimerSettings>> {
        let row = self
            .conn
            .query_row(
                "SELECT focus_duration, short_break_duration, long_break_duration, long_break_interval
                 FROM project_settings WHERE scope = ?1",
                params![settings_key(project_id)],
                |row| {
                    Ok(TimerSettings::from_raw(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(row)
    }

    fn put(&self, project_id: Option<&str>, settings: &TimerSettings) -> Result<()> {
        self.conn.execute(
            "INSERT INTO project_settings
                (scope, focus_duration, short_break_duration, long_break_duration, long_break_interval, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(scope) DO UPDATE SET
                focus_duration = excluded.focus_duration,
                short_break_duration = excluded.short_break_duration,
                long_break_duration = excluded.long_break_duration,
                long_break_interval = excluded.long_break_interval,
                updated_at = excluded.updated_at",
            params![
                settings_key(project_id),
                settings.focus_duration,
                settings.short_break_duration,
                settings.long_break_duration,
                settings.long_break_interval,
                fmt_ts(Utc::now()),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, project_id: Option<&str>) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM project_settings WHERE scope = ?1",
            params![settings_key(project_id)],
        )?;
        Ok(n > 0)
    }
}

impl SessionStore for Database {
    fn insert(&self, session: &CompletedSession) -> Result<StoredSession> {
        let id = Uuid::new_v4().to_string();
        let duration = i64::try_from(session.duration_secs).map_err(CoreError::persistence)?;
        self.conn
            .execute(
                "INSERT INTO sessions
                    (id, project_id, session_type, duration_secs, started_at, completed_at, is_manual, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    session.project_id,
                    session.session_type.as_str(),
                    duration,
                    fmt_ts(session.started_at),
                    fmt_ts(session.completed_at),
                    session.is_manual as i64,
                    session.notes,
                ],
            )
            .map_err(|e| CoreError::persistence(DatabaseError::from(e)))?;
        Ok(StoredSession {
            id,
            session: session.clone(),
        })
    }
}
