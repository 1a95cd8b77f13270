//! Tests for termination of the child when supervision has to stop.

use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use tempfile::TempDir;

use super::{process_gone, wait_for_pid_file, Running, IGNORE_SIGTERM, SLEEPER};

#[test]
fn stdin_close_terminates_cooperative_child() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");

    let mut running = Running::spawn(&[
        "-k",
        "5000",
        "--",
        "sh",
        "-c",
        SLEEPER,
        "sh",
        pid_file.to_str().unwrap(),
    ]);
    let child_pid = wait_for_pid_file(&pid_file);

    let start = Instant::now();
    running.close_stdin();
    let status = running.wait_within(Duration::from_secs(10));

    assert_eq!(status.code(), Some(1));
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "SIGTERM should have been enough, took {:?}",
        start.elapsed()
    );
    assert!(process_gone(child_pid));
}

#[test]
fn stdin_close_kills_child_ignoring_sigterm() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");

    let mut running = Running::spawn(&[
        "--delay-to-sigkill",
        "500",
        "--",
        "sh",
        "-c",
        IGNORE_SIGTERM,
        "sh",
        pid_file.to_str().unwrap(),
    ]);
    let child_pid = wait_for_pid_file(&pid_file);

    let start = Instant::now();
    running.close_stdin();
    let status = running.wait_within(Duration::from_secs(10));
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(1));
    assert!(
        elapsed >= Duration::from_millis(450),
        "SIGKILL sent before the grace period: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(2),
        "escalation took {elapsed:?}, expected about two stages of 500ms"
    );
    assert!(process_gone(child_pid));
}

#[test]
fn terminate_request_to_supervisor_stops_child() {
    for signal in [Signal::SIGTERM, Signal::SIGINT, Signal::SIGQUIT] {
        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("pid");

        let running = Running::spawn(&[
            "-k",
            "200",
            "--",
            "sh",
            "-c",
            IGNORE_SIGTERM,
            "sh",
            pid_file.to_str().unwrap(),
        ]);
        let child_pid = wait_for_pid_file(&pid_file);

        kill(running.pid(), signal).unwrap();
        let status = running.wait_within(Duration::from_secs(10));

        assert_eq!(status.code(), Some(1), "after {signal}");
        assert!(process_gone(child_pid), "child survived {signal}");
    }
}

#[test]
fn second_terminate_request_skips_grace_period() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");

    let mut running = Running::spawn(&[
        "-k",
        "5000",
        "--",
        "sh",
        "-c",
        IGNORE_SIGTERM,
        "sh",
        pid_file.to_str().unwrap(),
    ]);
    let child_pid = wait_for_pid_file(&pid_file);

    let start = Instant::now();
    running.close_stdin();
    // Let the escalation reach its graceful wait before asking again.
    std::thread::sleep(Duration::from_millis(300));
    kill(running.pid(), Signal::SIGTERM).unwrap();
    let status = running.wait_within(Duration::from_secs(10));
    let elapsed = start.elapsed();

    assert_eq!(status.code(), Some(1));
    assert!(
        elapsed < Duration::from_secs(3),
        "still waited out the grace period: {elapsed:?}"
    );
    assert!(process_gone(child_pid));
}

#[test]
fn sigkill_timeout_is_configurable_from_file() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");
    let config = dir.path().join("childwarden.toml");
    std::fs::write(&config, "delay_to_sigkill_ms = 100\n").unwrap();

    let mut running = Running::spawn(&[
        "--config",
        config.to_str().unwrap(),
        "--",
        "sh",
        "-c",
        IGNORE_SIGTERM,
        "sh",
        pid_file.to_str().unwrap(),
    ]);
    let child_pid = wait_for_pid_file(&pid_file);

    let start = Instant::now();
    running.close_stdin();
    let status = running.wait_within(Duration::from_secs(10));

    assert_eq!(status.code(), Some(1));
    assert!(start.elapsed() < Duration::from_millis(1500));
    assert!(process_gone(child_pid));
}
