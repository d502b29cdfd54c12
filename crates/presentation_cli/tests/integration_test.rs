//! Integration tests for the `trayecto` binary
//!
//! Only commands that need no browser, routing engine or schedule file are
//! run end to end.

use std::path::Path;
use std::process::{Command, Output};

fn trayecto(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trayecto"))
        .args(args)
        .current_dir(dir)
        .env_remove("TRAYECTO_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn check_config_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let output = trayecto(dir.path(), &["check-config"]);

    assert!(output.status.success());
    let config = stdout_json(&output);
    assert_eq!(config["schedule"]["path"], "gtfs.db");
    assert_eq!(config["browser"]["headless"], true);
    assert_eq!(config["logging"]["log_format"], "text");
}

#[test]
fn check_config_reads_local_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("trayecto.toml"),
        "[routing]\nbase_url = \"http://osrm.lan:5000\"\n",
    )
    .unwrap();

    let output = trayecto(dir.path(), &["check-config"]);

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["routing"]["base_url"], "http://osrm.lan:5000");
}

#[test]
fn explicit_config_flag_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[schedule]\npath = \"/data/santiago.db\"\n").unwrap();

    let output = trayecto(
        dir.path(),
        &["--config", path.to_str().unwrap(), "check-config"],
    );

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["schedule"]["path"], "/data/santiago.db");
}

#[test]
fn invalid_config_fails_with_section_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("trayecto.toml"),
        "[browser]\npage_timeout_secs = 0\n",
    )
    .unwrap();

    let output = trayecto(dir.path(), &["check-config"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("browser"));
}

#[test]
fn missing_schedule_database_fails_before_scraping() {
    let dir = tempfile::tempdir().unwrap();
    let output = trayecto(dir.path(), &["arrivals", "PA433"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn subcommand_is_required() {
    let dir = tempfile::tempdir().unwrap();
    let output = trayecto(dir.path(), &[]);
    assert!(!output.status.success());
}
