//! Translation of a reaped child's wait status into our own exit code.

use nix::sys::wait::WaitStatus;

/// Generic failure exit code.
pub const EXIT_FAILURE: i32 = 1;

/// Offset added to a signal number when a child is killed by that signal.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Map a child's wait status to the exit code the supervisor reports.
///
/// Normal exits propagate the child's code, deaths by signal `N` become
/// `128 + N` (the POSIX shell convention), anything else is
/// [`EXIT_FAILURE`].
#[must_use]
pub fn exit_code_for(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => {
            tracing::debug!(code, "Child exited");
            code
        }
        WaitStatus::Signaled(_, signal, _) => {
            let code = SIGNAL_EXIT_BASE + signal as i32;
            tracing::debug!(%signal, code, "Child terminated via signal");
            code
        }
        other => {
            tracing::debug!(status = ?other, "Child terminated with unexpected status");
            EXIT_FAILURE
        }
    }
}
