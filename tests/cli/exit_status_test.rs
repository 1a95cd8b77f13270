//! Tests for exit status propagation.

use std::io::Read;

use nix::sys::signal::Signal;
use tempfile::TempDir;

use super::run;

#[test]
fn normal_exit_code_is_propagated() {
    for code in [0, 1, 2, 3, 42, 100, 127, 200, 254] {
        let script = format!("exit {code}");
        let (status, _) = run(&["--", "sh", "-c", &script]);
        assert_eq!(status.code(), Some(code), "child exited with {code}");
    }
}

#[test]
fn signal_death_reports_128_plus_signal() {
    for (name, signal) in [
        ("TERM", Signal::SIGTERM),
        ("KILL", Signal::SIGKILL),
        ("USR1", Signal::SIGUSR1),
    ] {
        let script = format!("kill -{name} $$; sleep 1; exit 99");
        let (status, _) = run(&["--", "sh", "-c", &script]);
        assert_eq!(
            status.code(),
            Some(128 + signal as i32),
            "child killed itself with SIG{name}"
        );
    }
}

#[test]
fn child_writes_file_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hello.txt");
    let path_str = path.to_str().unwrap();

    let (status, _) = run(&[
        "--",
        "sh",
        "-c",
        r#"printf 'Hello, world!\n' > "$1""#,
        "sh",
        path_str,
    ]);

    assert_eq!(status.code(), Some(0));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello, world!\n");
}

#[test]
fn program_found_through_path() {
    let (status, _) = run(&["true"]);
    assert_eq!(status.code(), Some(0));

    let (status, _) = run(&["false"]);
    assert_eq!(status.code(), Some(1));
}

#[test]
fn missing_program_exits_with_failure() {
    let (status, stderr) = run(&["--", "/nonexistent/childwarden-fixture"]);
    assert_eq!(status.code(), Some(1));
    assert!(
        stderr.contains("Failed to run child"),
        "expected a diagnostic, got: {stderr}"
    );
}

#[cfg(target_os = "linux")]
#[test]
fn arg0_override_is_seen_by_child() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cmdline");
    let path_str = path.to_str().unwrap();

    let (status, _) = run(&[
        "--arg0",
        "renamed-shell",
        "--",
        "sh",
        "-c",
        r#"tr '\0' ' ' < /proc/$$/cmdline > "$1""#,
        "sh",
        path_str,
    ]);

    assert_eq!(status.code(), Some(0));
    let cmdline = std::fs::read_to_string(&path).unwrap();
    assert!(
        cmdline.starts_with("renamed-shell "),
        "unexpected cmdline: {cmdline}"
    );
}

#[test]
fn child_inherits_stdout() {
    let mut child = super::childwarden()
        .args(["--", "echo", "through the supervisor"])
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take();

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();
    let status = child.wait().unwrap();
    drop(stdin);

    assert_eq!(status.code(), Some(0));
    assert_eq!(stdout, "through the supervisor\n");
}
