use assert_cmd::Command;
use predicates::prelude::*;

// Helper function to initialize the command to test.
fn stackctl(project_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stackctl"));
    cmd.current_dir(project_dir);
    // Keep the user-level command directory out of the picture.
    cmd.env("XDG_CONFIG_HOME", project_dir.join(".xdg"));
    cmd.env_remove("STACKCTL_CONFIG");
    cmd
}

#[test]
fn test_help_flag() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Configuration-driven project stack CLI",
        ));
}

#[test]
fn test_version_flag() {
    let temp_dir = tempfile::tempdir().unwrap();

    let version = env!("CARGO_PKG_VERSION");
    let expected = format!("stackctl {}", version);

    stackctl(temp_dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[test]
fn test_unknown_command_fails_with_usage() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .arg("unknown-command-xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: stackctl"));
}

#[test]
fn test_bare_invocation_prints_overview() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("stackctl commands"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_info_reads_project_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("stackctl.kdl"),
        r#"
        project "integration"
        executor "local" {
            shell "/bin/sh"
        }
        "#,
    )
    .unwrap();

    stackctl(temp_dir.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("integration"))
        .stdout(predicate::str::contains("local"));
}

#[test]
fn test_info_json_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("stackctl.kdl"),
        r#"
        project "machines"
        database { driver "none" }
        "#,
    )
    .unwrap();

    let output = stackctl(temp_dir.path())
        .args(["info", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(value["project"], "machines");
    assert_eq!(value["database"], "none");
}

#[test]
fn test_custom_command_runs_through_local_executor() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("stackctl.kdl"),
        r#"
        project "custom"
        commands "commands.kdl"
        "#,
    )
    .unwrap();
    std::fs::write(
        temp_dir.path().join("commands.kdl"),
        r#"
        command "hello" {
            description "Say hello"
            run "echo hi-from-custom"
        }
        "#,
    )
    .unwrap();

    stackctl(temp_dir.path())
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("hi-from-custom"));
}

#[test]
fn test_missing_custom_path_degrades_to_warning() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("stackctl.kdl"),
        r#"
        project "degraded"
        commands "missing/commands"
        "#,
    )
    .unwrap();

    stackctl(temp_dir.path())
        .arg("info")
        .assert()
        .success()
        .stderr(predicate::str::contains("Custom command path not found"))
        .stdout(predicate::str::contains("degraded"));
}

#[test]
fn test_explicit_config_path_must_exist() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .args(["--config", "nope.kdl", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project configuration found"));
}

#[test]
fn test_db_parent_alone_shows_help() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("stackctl.kdl"),
        r#"
        project "dbproj"
        database {
            driver "postgres"
            name "dbproj"
            user "dbproj"
        }
        "#,
    )
    .unwrap();

    // Selecting the parent without a subcommand must show usage, not
    // silently succeed.
    stackctl(temp_dir.path())
        .arg("db")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backup"));
}

#[test]
fn test_completions_generate_for_bash() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stackctl"));
}

#[test]
fn test_unsupported_completion_shell_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    stackctl(temp_dir.path())
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported shell"));
}
