//! Interactive timer shell.
//!
//! Reads one command per line from stdin while the countdown runs, and
//! renders the service's events as they arrive.

use std::io::Write;

use clap::Subcommand;
use pomotrack_core::storage::{SessionStore, SettingsStore};
use pomotrack_core::timer::format_mm_ss;
use pomotrack_core::{
    Config, CoreError, Database, Event, MemoryStore, ServiceOptions, SessionType, TimerService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use super::require_project;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in this terminal (type `help` for commands)
    Run {
        /// Project to record focus sessions against
        #[arg(long)]
        project: Option<String>,
        /// Keep settings and sessions in memory only
        #[arg(long)]
        ephemeral: bool,
    },
}

const HELP: &str = "commands: start | pause | reset | switch <focus|short|long> | \
project <id|none> | next | dismiss | status | help | quit";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Start,
    Pause,
    Reset,
    Switch(SessionType),
    Project(Option<String>),
    Next,
    Dismiss,
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        let cmd = match (verb, arg) {
            ("start", None) => Self::Start,
            ("pause", None) => Self::Pause,
            ("reset", None) => Self::Reset,
            ("switch", Some(t)) => Self::Switch(t.parse().map_err(|e| format!("{e}"))?),
            ("project", Some("none")) => Self::Project(None),
            ("project", Some(id)) => Self::Project(Some(id.to_string())),
            ("next", None) => Self::Next,
            ("dismiss", None) => Self::Dismiss,
            ("status", None) => Self::Status,
            ("help", _) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            _ => return Err(format!("unrecognized command '{}'", line.trim())),
        };
        Ok(Some(cmd))
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { project, ephemeral } => {
            let config = Config::load()?;
            let project = project.or_else(|| config.timer.default_project.clone());
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(shell(config, project, ephemeral));
            // Don't wait on a stdin read that may still be parked.
            runtime.shutdown_background();
            result
        }
    }
}

/// Settings store, session store, and the database used to look projects up
/// (`None` when ephemeral, where any id is accepted).
type Stores = (Box<dyn SettingsStore>, Box<dyn SessionStore>, Option<Database>);

fn open_stores(project: Option<&str>, ephemeral: bool) -> Result<Stores, Box<dyn std::error::Error>> {
    if ephemeral {
        let store = MemoryStore::new();
        return Ok((Box::new(store.clone()), Box::new(store), None));
    }
    let projects = Database::open()?;
    if let Some(id) = project {
        require_project(&projects, id)?;
    }
    Ok((
        Box::new(Database::open()?),
        Box::new(Database::open()?),
        Some(projects),
    ))
}

/// Rebinding to a project that does not exist would record orphan sessions.
fn check_project(projects: Option<&Database>, id: Option<&str>) -> Result<(), CoreError> {
    match (projects, id) {
        (Some(db), Some(id)) => require_project(db, id),
        _ => Ok(()),
    }
}

async fn shell(
    config: Config,
    project: Option<String>,
    ephemeral: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (settings_store, session_store, projects) = open_stores(project.as_deref(), ephemeral)?;
    let service = TimerService::new(
        settings_store,
        session_store,
        ServiceOptions {
            tick: config.tick_interval(),
            project_id: project,
        },
    );
    let mut events = service.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_status(&service);
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ShellCommand::parse(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(cmd)) => execute(&service, projects.as_ref(), cmd),
                    Ok(None) => {}
                    Err(msg) => println!("{msg}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => render(&event, &config),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "shell fell behind on events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    service.shutdown().await;
    // Sessions recorded during shutdown are still in the channel.
    while let Ok(event) = events.try_recv() {
        if !matches!(event, Event::Tick { .. }) {
            render(&event, &config);
        }
    }
    Ok(())
}

fn execute(service: &TimerService, projects: Option<&Database>, cmd: ShellCommand) {
    let outcome = match cmd {
        ShellCommand::Start => service.start(),
        ShellCommand::Pause => service.pause(),
        ShellCommand::Reset => service.reset(),
        ShellCommand::Switch(t) => service.switch_session(t),
        ShellCommand::Project(id) => {
            if let Err(e) = check_project(projects, id.as_deref()) {
                println!("{e}");
                return;
            }
            service.set_current_project(id)
        }
        ShellCommand::Next => service.accept_and_start_next(),
        ShellCommand::Dismiss => service.dismiss(),
        ShellCommand::Status => {
            print_status(service);
            return;
        }
        ShellCommand::Help => {
            println!("{HELP}");
            return;
        }
        ShellCommand::Quit => return,
    };
    // Events are rendered from the broadcast; only no-ops need a reply.
    if outcome.is_none() {
        println!("nothing to do");
    }
}

fn print_status(service: &TimerService) {
    let state = service.state();
    let project = state.current_project_id.as_deref().unwrap_or("(none)");
    println!(
        "{} {} [{}] project: {project}, focus sessions: {}",
        state.session_type.label(),
        format_mm_ss(state.time_left),
        if state.is_running { "running" } else { "paused" },
        state.completed_focus_count,
    );
    if let Some(pending) = service.pending() {
        println!(
            "{} complete; next up: {} (`next` or `dismiss`)",
            pending.session_type.label(),
            pending.next_session_type.label(),
        );
    }
}

fn render(event: &Event, config: &Config) {
    let mut out = std::io::stdout();
    let line = match event {
        Event::Tick { time_left } => {
            let _ = write!(out, "\r{}  ", format_mm_ss(*time_left));
            let _ = out.flush();
            return;
        }
        Event::TimerStarted {
            session_type,
            time_left,
            ..
        } => format!("{} started ({})", session_type.label(), format_mm_ss(*time_left)),
        Event::TimerPaused { time_left, .. } => format!("paused at {}", format_mm_ss(*time_left)),
        Event::TimerReset {
            session_type,
            time_left,
            ..
        } => format!("{} reset to {}", session_type.label(), format_mm_ss(*time_left)),
        Event::SessionSwitched { to, time_left, .. } => {
            format!("switched to {} ({})", to.label(), format_mm_ss(*time_left))
        }
        Event::ProjectChanged { project_id, .. } => {
            format!("project: {}", project_id.as_deref().unwrap_or("(none)"))
        }
        Event::SettingsApplied { settings, .. } => format!(
            "settings: focus {}m, short {}m, long {}m, long break every {}",
            settings.focus_duration,
            settings.short_break_duration,
            settings.long_break_duration,
            settings.long_break_interval,
        ),
        Event::TimerCompleted {
            session_type,
            next_session_type,
            ..
        } => {
            if config.notifications.enabled && config.notifications.bell {
                let _ = write!(out, "\x07");
            }
            if config.notifications.enabled {
                format!(
                    "{} complete! Next up: {}. Type `next` to start it or `dismiss`.",
                    session_type.label(),
                    next_session_type.label(),
                )
            } else {
                format!("{} complete", session_type.label())
            }
        }
        Event::CompletionDismissed { .. } => "dismissed".to_string(),
        Event::SessionRecorded { duration_secs, .. } => {
            format!("session recorded ({} min)", duration_secs / 60)
        }
        Event::SessionRecordFailed { message, .. } => {
            format!("failed to record session: {message}")
        }
        Event::StateSnapshot { .. } => return,
    };
    let _ = writeln!(out, "\r{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shell_commands() {
        assert_eq!(ShellCommand::parse("start"), Ok(Some(ShellCommand::Start)));
        assert_eq!(ShellCommand::parse("  "), Ok(None));
        assert_eq!(
            ShellCommand::parse("switch long"),
            Ok(Some(ShellCommand::Switch(SessionType::LongBreak)))
        );
        assert_eq!(
            ShellCommand::parse("project none"),
            Ok(Some(ShellCommand::Project(None)))
        );
        assert_eq!(
            ShellCommand::parse("project abc"),
            Ok(Some(ShellCommand::Project(Some("abc".into()))))
        );
        assert_eq!(ShellCommand::parse("exit"), Ok(Some(ShellCommand::Quit)));
    }

    #[test]
    fn project_rebind_requires_a_stored_project() {
        let db = Database::open_memory().unwrap();
        let err = check_project(Some(&db), Some("bogus")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "project", .. }));
        assert_eq!(err.to_string(), "project not found: bogus");

        let project = pomotrack_core::Project::new("Thesis", None).unwrap();
        db.create_project(&project).unwrap();
        assert!(check_project(Some(&db), Some(&project.id)).is_ok());
        assert!(check_project(Some(&db), None).is_ok());
        // ephemeral shells have no project table to check against
        assert!(check_project(None, Some("bogus")).is_ok());
    }

    #[test]
    fn rejects_unknown_or_incomplete_commands() {
        assert!(ShellCommand::parse("switch").is_err());
        assert!(ShellCommand::parse("switch nap").is_err());
        assert!(ShellCommand::parse("start now").is_err());
        assert!(ShellCommand::parse("launch").is_err());
    }
}
