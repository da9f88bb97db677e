//! SQLite store on disk: projects, sessions, settings and reopen.

use chrono::{Duration, Utc};
use pomotrack_core::storage::{SessionFilter, SessionStore, SettingsStore};
use pomotrack_core::{
    CompletedSession, Database, Project, SessionRecorder, SessionType, SettingsResolver,
    TimerSettings,
};

fn focus(project: &str, minutes_ago: i64) -> CompletedSession {
    CompletedSession::timed(
        project.into(),
        SessionType::Focus,
        1500,
        Utc::now() - Duration::minutes(minutes_ago),
    )
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomotrack.db");

    let project = Project::new("Thesis", None).unwrap();
    {
        let db = Database::open_at(&path).unwrap();
        db.create_project(&project).unwrap();
        db.put(Some(&project.id), &TimerSettings::new(50, 10, 30, 3).unwrap())
            .unwrap();
        db.insert(&focus(&project.id, 30)).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let projects = db.list_projects().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, project.id);
    assert_eq!(projects[0].name, "Thesis");
    assert_eq!(projects[0].color, "#3b82f6");
    let resolver = SettingsResolver::new(Box::new(db));
    assert_eq!(resolver.resolve(Some(&project.id)).focus_duration, 50);
    assert_eq!(resolver.resolve(None), TimerSettings::default());
}

#[test]
fn recorder_writes_through_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomotrack.db");
    let recorder = SessionRecorder::new(Box::new(Database::open_at(&path).unwrap()));

    recorder.record(&focus("p", 90)).unwrap();
    recorder.record(&focus("p", 10)).unwrap();
    recorder.record(&focus("q", 5)).unwrap();

    let db = Database::open_at(&path).unwrap();
    let all = db.list_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].session.project_id, "q");

    let recent_p = db
        .list_sessions(&SessionFilter {
            project_id: Some("p".into()),
            since: Some(Utc::now() - Duration::minutes(60)),
            ..SessionFilter::default()
        })
        .unwrap();
    assert_eq!(recent_p.len(), 1);
}

#[test]
fn deleting_a_project_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("pomotrack.db")).unwrap();
    let project = Project::new("Side quest", Some("#10B981")).unwrap();
    assert_eq!(project.color, "#10b981");
    db.create_project(&project).unwrap();
    db.put(Some(&project.id), &TimerSettings::default()).unwrap();
    db.insert(&focus(&project.id, 1)).unwrap();

    assert!(db.delete_project(&project.id).unwrap());
    assert!(db.get_project(&project.id).unwrap().is_none());
    assert!(SettingsStore::get(&db, Some(&project.id)).unwrap().is_none());
    assert!(db
        .list_sessions(&SessionFilter::default())
        .unwrap()
        .is_empty());
    assert!(!db.delete_project(&project.id).unwrap());
}
