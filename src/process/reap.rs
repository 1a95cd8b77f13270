//! Reaping of terminated children.

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Reap every child that has already terminated, without blocking.
///
/// One SIGCHLD may stand for several deaths, so this keeps calling
/// `waitpid(-1, WNOHANG)` until nothing is left to reap. Children other
/// than `tracked` are logged and discarded. Returns the wait status of
/// `tracked` as soon as it is reaped, or `None` if it is still running.
#[must_use]
pub fn reap_terminated(tracked: Pid) -> Option<WaitStatus> {
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => return None,
            Ok(status) if status.pid() == Some(tracked) => {
                tracing::debug!(pid = %tracked, ?status, "Cleaned up matching pid");
                return Some(status);
            }
            Ok(status) => {
                tracing::debug!(
                    ?status,
                    child = %tracked,
                    "Something else caused SIGCHLD, discarding"
                );
            }
            Err(Errno::EINTR) => {}
            Err(Errno::ECHILD) => return None,
            Err(errno) => {
                tracing::warn!(error = %errno, "waitpid failed");
                return None;
            }
        }
    }
}
