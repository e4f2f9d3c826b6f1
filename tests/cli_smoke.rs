//! CLI smoke tests: every subcommand runs end to end against the built binary.

mod common;

use std::fs;

use serde_json::Value;

fn json_line(stdout: &str) -> Value {
    let line = stdout.lines().next().expect("at least one output line");
    serde_json::from_str(line).expect("stdout should be a JSON line")
}

#[test]
fn help_command_prints_usage() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("help_command_prints_usage", home.path(), &["--help"]);
    assert!(
        result.status.success(),
        "expected success; transcript: {}",
        result.transcript.display()
    );
    assert!(
        result.stdout.contains("Usage: atl [OPTIONS] <COMMAND>"),
        "missing help banner; transcript: {}",
        result.transcript.display()
    );
}

#[test]
fn version_command_prints_version() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("version_command_prints_version", home.path(), &["--version"]);
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    assert!(result.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn demo_writes_loadable_dataset() {
    let home = tempfile::tempdir().unwrap();
    let dataset = home.path().join("data").join("demo.json");
    let dataset_arg = dataset.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "demo_writes_loadable_dataset",
        home.path(),
        &["demo", "--seed", "11", "--count", "15", "-o", &dataset_arg, "--json"],
    );
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    assert_eq!(json_line(&result.stdout)["events"], 15);

    let records: Vec<Value> =
        serde_json::from_str(&fs::read_to_string(&dataset).unwrap()).unwrap();
    assert_eq!(records.len(), 15);

    let render = common::run_cli_case(
        "demo_dataset_renders",
        home.path(),
        &["render", &dataset_arg, "--select", "evt-0003", "--json"],
    );
    assert!(render.status.success(), "transcript: {}", render.transcript.display());
    let payload = json_line(&render.stdout);
    assert_eq!(payload["format"], "text");
    let lines = payload["lines"].as_array().unwrap();
    assert!(lines.iter().any(|line| line.as_str().unwrap().contains("<-|")));
}

#[test]
fn positions_reports_centered_selection() {
    let home = tempfile::tempdir().unwrap();
    let dataset = home.path().join("events.json");
    fs::write(
        &dataset,
        r#"[
            {"id": "b", "title": "Second", "date": "2020-03-01"},
            {"id": "a", "title": "First", "date": "2020-01-23"}
        ]"#,
    )
    .unwrap();
    let dataset_arg = dataset.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "positions_reports_centered_selection",
        home.path(),
        &["positions", &dataset_arg, "--select", "b", "--width", "100", "--json"],
    );
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    let payload = json_line(&result.stdout);
    let positions = payload["positions"].as_array().unwrap();
    let selected = positions
        .iter()
        .find(|node| node["event_id"] == "b")
        .expect("selected node is visible");
    // 100 columns x 8 px, centered
    assert_eq!(selected["screen_x"], 400.0);
    assert_eq!(payload["viewport"]["selected_index"], 1);
}

#[test]
fn render_ops_emits_draw_list() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "render_ops_emits_draw_list",
        home.path(),
        &["render", "--demo", "--format", "ops", "--zoom", "decade", "--json"],
    );
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["viewport"]["zoom"], "decade");
    let ops = payload["ops"].as_array().unwrap();
    assert_eq!(ops[0]["op"], "clear");
    assert!(ops.iter().any(|op| op["op"] == "text"));
}

#[test]
fn missing_dataset_is_runtime_error() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "missing_dataset_is_runtime_error",
        home.path(),
        &["render", "/nonexistent/atl/events.json"],
    );
    assert_eq!(result.status.code(), Some(2), "transcript: {}", result.transcript.display());
    assert!(result.stderr.contains("ATL-3001"));
}

#[test]
fn malformed_dataset_is_user_error() {
    let home = tempfile::tempdir().unwrap();
    let dataset = home.path().join("bad.json");
    fs::write(&dataset, r#"[{"id": "x", "title": "X", "date": "yesterday"}]"#).unwrap();
    let result = common::run_cli_case(
        "malformed_dataset_is_user_error",
        home.path(),
        &["render", &dataset.to_string_lossy()],
    );
    assert_eq!(result.status.code(), Some(1), "transcript: {}", result.transcript.display());
    assert!(result.stderr.contains("ATL-2002"));
}

#[test]
fn huge_offset_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "huge_offset_is_rejected",
        home.path(),
        &["render", "--demo", "--offset", "1e16"],
    );
    assert_eq!(result.status.code(), Some(1), "transcript: {}", result.transcript.display());
    assert!(result.stderr.contains("--offset"));
}

#[test]
fn config_validate_reports_bad_values() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("atl.toml");
    fs::write(&config, "[input]\nscroll_fraction = 2.0\n").unwrap();
    let result = common::run_cli_case(
        "config_validate_reports_bad_values",
        home.path(),
        &["--config", &config.to_string_lossy(), "config", "validate", "--json"],
    );
    assert_eq!(result.status.code(), Some(1), "transcript: {}", result.transcript.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "ATL-1001");
}

#[test]
fn config_path_defaults_under_home() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "config_path_defaults_under_home",
        home.path(),
        &["config", "path", "--json"],
    );
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["exists"], false);
    assert!(
        payload["path"]
            .as_str()
            .unwrap()
            .ends_with(".config/atl/config.toml")
    );
}

#[test]
fn view_refuses_non_terminal_stdout() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case(
        "view_refuses_non_terminal_stdout",
        home.path(),
        &["view", "--demo"],
    );
    assert_eq!(result.status.code(), Some(1), "transcript: {}", result.transcript.display());
    assert!(result.stderr.contains("interactive terminal"));
}

#[test]
fn keys_lists_bindings() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case("keys_lists_bindings", home.path(), &["keys", "--json"]);
    assert!(result.status.success(), "transcript: {}", result.transcript.display());
    let payload = json_line(&result.stdout);
    assert!(payload["bindings"].as_array().unwrap().len() >= 5);
}
