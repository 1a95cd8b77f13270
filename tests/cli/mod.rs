//! Helpers for driving the childwarden binary.

mod escalation_test;
mod exit_status_test;
mod usage_test;

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Shell snippet that ignores SIGTERM, records its pid and sleeps.
pub const IGNORE_SIGTERM: &str = r#"trap "" TERM; echo $$ > "$1"; exec sleep 120"#;

/// Shell snippet that records its pid and sleeps.
pub const SLEEPER: &str = r#"echo $$ > "$1"; exec sleep 120"#;

/// Build a command for the binary under test.
pub fn childwarden() -> Command {
    Command::new(env!("CARGO_BIN_EXE_childwarden"))
}

/// A running childwarden whose stdin stays open until `close_stdin`.
pub struct Running {
    pub child: Child,
    stdin: Option<ChildStdin>,
}

impl Running {
    pub fn spawn(args: &[&str]) -> Self {
        let mut child = childwarden()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn childwarden");
        let stdin = child.stdin.take();
        Self { child, stdin }
    }

    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    pub fn pid(&self) -> Pid {
        Pid::from_raw(i32::try_from(self.child.id()).unwrap())
    }

    /// Wait for exit, keeping stdin open. Returns the status and stderr.
    pub fn wait(mut self) -> (ExitStatus, String) {
        let status = self.child.wait().expect("Failed to wait for childwarden");
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_string(&mut stderr).unwrap();
        }
        drop(self.stdin);
        (status, stderr)
    }

    /// Wait for exit, failing the test after `limit`.
    pub fn wait_within(mut self, limit: Duration) -> ExitStatus {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            if start.elapsed() > limit {
                let _ = self.child.kill();
                panic!("childwarden did not exit within {limit:?}");
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Run childwarden to completion with stdin held open.
pub fn run(args: &[&str]) -> (ExitStatus, String) {
    Running::spawn(args).wait()
}

/// Wait until a fixture has written its pid.
pub fn wait_for_pid_file(path: &Path) -> Pid {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(10) {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse::<i32>() {
                return Pid::from_raw(pid);
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("fixture never wrote {}", path.display());
}

/// Check that a process no longer exists.
pub fn process_gone(pid: Pid) -> bool {
    kill(pid, None::<Signal>) == Err(Errno::ESRCH)
}
