//! Binary-level checks: argument parsing, configuration errors and exit codes.
//!
//! None of these reach the network; every run either fails before the first
//! request or uses a subcommand that never generates.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEST_KEY: &str = "AIzaTestKey0123456789abcdWXYZ";

fn sermon_auto(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sermon-auto").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_MODEL")
        .env_remove("SERMON_AUTO_OUTPUT_DIR")
        .env_remove("SERMON_AUTO_FEEDBACK_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("feedback"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn missing_api_key_is_a_usage_error() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .args(["run", "--range", "Ezekiel 36", "--date", "2026-03-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GEMINI_API_KEY"));

    assert!(!workdir.path().join("output").exists());
}

#[test]
fn placeholder_api_key_is_rejected() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .env("GEMINI_API_KEY", "your_api_key_here")
        .args(["run", "--range", "Ezekiel 36", "--date", "2026-03-01"])
        .assert()
        .code(2);
}

#[test]
fn invalid_date_is_a_usage_error() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .env("GEMINI_API_KEY", TEST_KEY)
        .args(["run", "--range", "Ezekiel 36", "--date", "03/01/2026"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("03/01/2026"));
}

#[test]
fn blank_range_is_a_usage_error() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .env("GEMINI_API_KEY", TEST_KEY)
        .args(["run", "--range", "   ", "--date", "2026-03-01"])
        .assert()
        .code(2);
}

#[test]
fn invalid_duration_is_rejected_by_the_parser() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .args(["run", "--range", "Ezekiel 36", "--duration", "45"])
        .assert()
        .code(2);
}

#[test]
fn config_masks_the_api_key() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .env("GEMINI_API_KEY", TEST_KEY)
        .env("GEMINI_MODEL", "gemini-test")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(TEST_KEY).not())
        .stdout(predicate::str::contains("****WXYZ"))
        .stdout(predicate::str::contains("gemini-test"))
        .stdout(predicate::str::contains("(env)"));
}

#[test]
fn config_file_values_are_reported() {
    let workdir = TempDir::new().unwrap();
    let config_dir = workdir.path().join(".sermon-auto");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[history]\nmax_entries = 3\n",
    )
    .unwrap();

    sermon_auto(&workdir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains("history.max_entries"));
}

#[test]
fn unknown_config_key_is_a_usage_error() {
    let workdir = TempDir::new().unwrap();
    let config_dir = workdir.path().join(".sermon-auto");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[llm]\nmodle = \"x\"\n").unwrap();

    sermon_auto(&workdir).arg("config").assert().code(2);
}

#[test]
fn history_without_previous_runs() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No previous selections found."));
}

#[test]
fn history_reads_previous_selection_artifacts() {
    let workdir = TempDir::new().unwrap();
    let run_dir = workdir.path().join("sermons").join("2026-03-01");
    fs::create_dir_all(&run_dir).unwrap();
    fs::write(
        run_dir.join("20260224_101500_123_phase1_selection.md"),
        "## Result\nSelected passage: Ezekiel 36:24-28\nRecommended theme: A new heart\n",
    )
    .unwrap();

    sermon_auto(&workdir)
        .env("SERMON_AUTO_OUTPUT_DIR", "sermons")
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. 2026-03-01 (run 2026-02-24 10:15:00)"))
        .stdout(predicate::str::contains("Selected passage: Ezekiel 36:24-28"));
}

#[test]
fn feedback_is_saved_from_stdin() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .env("SERMON_AUTO_FEEDBACK_DIR", "fb")
        .args(["feedback", "--date", "2026-03-01"])
        .write_stdin("The new heart image\n\nA bit long\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Feedback saved"));

    let saved: Vec<_> = fs::read_dir(workdir.path().join("fb"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("2026-03-01_feedback_"));

    let body = fs::read_to_string(workdir.path().join("fb").join(&saved[0])).unwrap();
    assert!(body.contains("The new heart image"));
    assert!(body.contains("(no opinion)"));
}

#[test]
fn feedback_rejects_invalid_date() {
    let workdir = TempDir::new().unwrap();
    sermon_auto(&workdir)
        .args(["feedback", "--date", "yesterday"])
        .assert()
        .code(2);
}
