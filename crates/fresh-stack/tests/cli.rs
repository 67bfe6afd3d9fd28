//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env(
        "FRESH_STACK_LOG_DIR",
        std::env::temp_dir().join("fresh-stack-test-logs"),
    );
    cmd
}

fn dir_arg(tmp: &TempDir) -> &str {
    tmp.path().to_str().unwrap()
}

/// A `PATH` holding only no-op stand-ins for `tools`.
#[cfg(unix)]
fn fake_path(tools: &[&str]) -> TempDir {
    use std::os::unix::fs::PermissionsExt;

    let bin = TempDir::new().unwrap();
    for tool in tools {
        let path = bin.path().join(tool);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    bin
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn long_help_lists_environment_variables() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("FRESH_STACK_LOG_PATH"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn new_help_shows_answer_flags() {
    cmd()
        .args(["new", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stack"))
        .stdout(predicate::str::contains("--no-overwrite"))
        .stdout(predicate::str::contains("--no-open"));
}

// =============================================================================
// List Command
// =============================================================================

#[test]
fn list_shows_every_stack() {
    let assert = cmd().arg("list").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    for id in [
        "react",
        "react-native",
        "flutter",
        "springboot",
        "nest",
        "node",
        "python",
    ] {
        assert!(stdout.contains(id), "missing {id} in:\n{stdout}");
    }
    assert!(stdout.contains("Spring Boot (Java)"));
}

#[test]
fn list_json_outputs_stacks_in_menu_order() {
    let output = cmd().args(["list", "--json"]).assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("list --json should output valid JSON");

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        ["react", "react-native", "flutter", "springboot", "nest", "node", "python"]
    );
    assert_eq!(json[3]["dependencies"], serde_json::json!(["java", "curl", "unzip"]));
}

// =============================================================================
// Doctor Command
// =============================================================================

#[test]
fn doctor_json_reports_stacks() {
    let tmp = TempDir::new().unwrap();
    let output = cmd()
        .args(["-C", dir_arg(&tmp), "doctor", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["stacks"].as_array().unwrap().len(), 7);
    assert_eq!(json["config"]["found"], false);
}

#[test]
fn doctor_text_runs_without_terminal() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["-C", dir_arg(&tmp), "doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stacks"));
}

// =============================================================================
// New Command
// =============================================================================

#[cfg(unix)]
#[test]
fn new_python_with_answers_creates_project() {
    let tmp = TempDir::new().unwrap();
    let bin = fake_path(&["python3"]);

    cmd()
        .env("PATH", bin.path())
        .args(["-C", dir_arg(&tmp), "new", "--stack", "python", "--name", "demo", "--no-open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to Fresh Stack CLI"))
        .stdout(predicate::str::contains("Creating Python app: demo"))
        .stdout(predicate::str::contains("Done! demo is ready to build."));

    assert_eq!(
        fs::read_to_string(tmp.path().join("demo").join("main.py")).unwrap(),
        "# Start your Python app here\n"
    );
}

#[cfg(unix)]
#[test]
fn answers_work_without_new_subcommand() {
    let tmp = TempDir::new().unwrap();
    let bin = fake_path(&["python3"]);

    cmd()
        .env("PATH", bin.path())
        .args(["-C", dir_arg(&tmp), "--stack", "python", "--name", "bare", "--no-open"])
        .assert()
        .success();

    assert!(tmp.path().join("bare").join("main.py").is_file());
}

#[cfg(unix)]
#[test]
fn missing_dependency_exits_one_without_touching_disk() {
    let tmp = TempDir::new().unwrap();
    let bin = fake_path(&["node"]);

    cmd()
        .env("PATH", bin.path())
        .args(["-C", dir_arg(&tmp), "new", "--stack", "python", "--name", "demo"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing dependency: python3"))
        .stdout(predicate::str::contains(
            "Please install the missing tools above and try again.",
        ));

    assert!(!tmp.path().join("demo").exists());
}

#[cfg(unix)]
#[test]
fn declined_overwrite_leaves_directory_alone() {
    let tmp = TempDir::new().unwrap();
    let bin = fake_path(&["python3"]);
    let existing = tmp.path().join("demo");
    fs::create_dir(&existing).unwrap();
    fs::write(existing.join("keep.txt"), "mine").unwrap();

    cmd()
        .env("PATH", bin.path())
        .args([
            "-C",
            dir_arg(&tmp),
            "new",
            "--stack",
            "python",
            "--name",
            "demo",
            "--no-overwrite",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    assert_eq!(fs::read_to_string(existing.join("keep.txt")).unwrap(), "mine");
    assert!(!existing.join("main.py").exists());
}

#[test]
fn invalid_name_flag_is_rejected() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["-C", dir_arg(&tmp), "new", "--stack", "python", "--name", "no spaces"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Use letters, numbers, dash or underscore only.",
        ));

    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn unknown_stack_flag_is_rejected() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["-C", dir_arg(&tmp), "new", "--stack", "cobol", "--name", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown stack 'cobol'"));
}

#[test]
fn conflicting_answer_flags_are_an_error() {
    cmd()
        .args(["new", "--open", "--no-open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_and_verbose_flags_accepted() {
    for flag in ["-q", "--quiet", "-v", "-vv", "--verbose"] {
        cmd().args([flag, "list"]).assert().success();
    }
}

#[test]
fn color_choices_accepted() {
    for choice in ["auto", "always", "never"] {
        cmd().args(["--color", choice, "list"]).assert().success();
    }
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "list"])
        .assert()
        .failure();
}
