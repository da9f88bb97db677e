//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway data
//! directory and verify outputs.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn cli(home: &Path) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-q", "-p", "pomotrack-cli", "--"])
        .env("POMOTRACK_HOME", home)
        .env_remove("RUST_LOG");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = cli(home)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

/// Parse the JSON that follows an optional "... created: <id>" line.
fn json_body(stdout: &str) -> serde_json::Value {
    let start = stdout.find(['{', '[']).expect("no JSON in output");
    serde_json::from_str(&stdout[start..]).expect("invalid JSON output")
}

fn create_project(home: &Path, name: &str) -> String {
    let out = run_cli_success(home, &["project", "create", name]);
    json_body(&out)["id"].as_str().unwrap().to_string()
}

#[test]
fn test_project_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let id = create_project(home.path(), "Reading");

    let list = json_body(&run_cli_success(home.path(), &["project", "list"]));
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["color"], "#3b82f6");

    let renamed = json_body(&run_cli_success(
        home.path(),
        &["project", "rename", &id, "Deep reading"],
    ));
    assert_eq!(renamed["name"], "Deep reading");

    run_cli_success(home.path(), &["project", "delete", &id]);
    let (_, stderr, code) = run_cli(home.path(), &["project", "delete", &id]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_project_rejects_bad_color() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["project", "create", "X", "--color", "blue"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_settings_project_scope_ignores_global_row() {
    let home = tempfile::tempdir().unwrap();
    let id = create_project(home.path(), "Writing");

    run_cli_success(home.path(), &["settings", "set", "focus=30"]);
    let shown = json_body(&run_cli_success(
        home.path(),
        &["settings", "show", "--project", &id],
    ));
    assert_eq!(shown["stored"], false);
    assert_eq!(shown["settings"]["focus_duration"], 25);
    let global = json_body(&run_cli_success(home.path(), &["settings", "show"]));
    assert_eq!(global["settings"]["focus_duration"], 30);

    run_cli_success(
        home.path(),
        &["settings", "set", "--project", &id, "focus=50", "interval=2"],
    );
    let shown = json_body(&run_cli_success(
        home.path(),
        &["settings", "show", "--project", &id],
    ));
    assert_eq!(shown["stored"], true);
    assert_eq!(shown["settings"]["focus_duration"], 50);
    assert_eq!(shown["settings"]["short_break_duration"], 5);

    let (_, _, code) = run_cli(home.path(), &["settings", "set", "focus=0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_manual_session_and_stats() {
    let home = tempfile::tempdir().unwrap();
    let id = create_project(home.path(), "Study");

    run_cli_success(
        home.path(),
        &["session", "add", &id, "--minutes", "25", "--notes", "chapter 3"],
    );
    run_cli_success(
        home.path(),
        &["session", "add", &id, "--minutes", "5", "--type", "short"],
    );

    let sessions = json_body(&run_cli_success(home.path(), &["session", "list"]));
    assert_eq!(sessions.as_array().unwrap().len(), 2);

    let focus = json_body(&run_cli_success(
        home.path(),
        &["session", "list", "--type", "focus"],
    ));
    assert_eq!(focus[0]["notes"], "chapter 3");
    assert_eq!(focus[0]["is_manual"], true);

    let summary = json_body(&run_cli_success(home.path(), &["stats", "summary"]));
    assert_eq!(summary["sessions"], 1);
    assert_eq!(summary["total_secs"], 1500);
    assert_eq!(summary["by_project"][0]["name"], "Study");

    let streak = json_body(&run_cli_success(home.path(), &["stats", "streak"]));
    assert_eq!(streak["streak_days"], 1);
}

#[test]
fn test_session_add_requires_known_project() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["session", "add", "nope", "--minutes", "25"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    let out = run_cli_success(home.path(), &["config", "get", "notifications.bell"]);
    assert_eq!(out.trim(), "true");

    run_cli_success(home.path(), &["config", "set", "notifications.bell", "false"]);
    let out = run_cli_success(home.path(), &["config", "get", "notifications.bell"]);
    assert_eq!(out.trim(), "false");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "timer.tick_interval_ms", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_timer_shell_status_and_quit() {
    let home = tempfile::tempdir().unwrap();
    let mut child = cli(home.path())
        .args(["timer", "run", "--ephemeral"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn timer shell");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"switch short\nstatus\nbogus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Focus Time 25:00 [paused]"));
    assert!(stdout.contains("Short Break 05:00 [paused]"));
    assert!(stdout.contains("unrecognized command 'bogus'"));
}

#[test]
fn test_timer_shell_rejects_unknown_project() {
    let home = tempfile::tempdir().unwrap();
    let id = create_project(home.path(), "Thesis");
    let mut child = cli(home.path())
        .args(["timer", "run"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn timer shell");

    let script = format!("project bogus\nstatus\nproject {id}\nstatus\nquit\n");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("project not found: bogus"));
    assert!(stdout.contains("project: (none), focus sessions"));
    assert!(stdout.contains(&format!("project: {id}, focus sessions")));
    assert!(!stdout.contains("project: bogus"));
}

#[test]
fn test_out_of_range_days_is_an_error_not_a_panic() {
    let home = tempfile::tempdir().unwrap();
    for args in [
        &["session", "list", "--days", "4000000000"][..],
        &["stats", "summary", "--days", "4000000000"][..],
    ] {
        let (_, stderr, code) = run_cli(home.path(), args);
        assert_eq!(code, 1, "{args:?}: {stderr}");
        assert!(stderr.contains("error: --days"), "{args:?}: {stderr}");
        assert!(!stderr.contains("panicked"));
    }
}
