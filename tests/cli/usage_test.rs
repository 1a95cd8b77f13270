//! Tests for the command-line surface.

use tempfile::TempDir;

use super::{childwarden, run};

#[test]
fn no_program_is_a_usage_error() {
    let output = childwarden().output().expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Usage"), "expected usage, got: {stderr}");
}

#[test]
fn help_lists_options() {
    let output = childwarden()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("--delay-to-sigkill"), "Expected --delay-to-sigkill in help");
    assert!(stdout.contains("--arg0"), "Expected --arg0 in help");
    assert!(stdout.contains("--config"), "Expected --config in help");
}

#[test]
fn invalid_config_file_aborts_before_spawning() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    let marker = dir.path().join("ran");
    std::fs::write(&config, "delay_to_sigkill_ms = \"later\"\n").unwrap();

    let (status, stderr) = run(&[
        "-c",
        config.to_str().unwrap(),
        "--",
        "touch",
        marker.to_str().unwrap(),
    ]);

    assert_eq!(status.code(), Some(1));
    assert!(stderr.contains("Failed to parse config file"), "got: {stderr}");
    assert!(!marker.exists(), "child must not run with a broken config");
}

#[test]
fn invalid_delay_is_a_usage_error() {
    let (status, stderr) = run(&["-k", "soon", "--", "true"]);
    assert_eq!(status.code(), Some(1));
    assert!(stderr.contains("soon"), "got: {stderr}");
}
