//! Escalating termination of a child that must not outlive the supervisor.
//!
//! The child is sent SIGTERM and given `timeout` to be reaped. If it is still
//! around it is sent SIGKILL and given another `timeout`. Both waits observe
//! the same signal relay as the event loop, but only accept reap events and
//! terminate requests. A terminate request cuts the current wait short.

use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use tokio::time::Instant;

use crate::process::{exit_code_for, reap_terminated};
use crate::signal::{SignalEvent, SignalRelay};
use crate::supervisor::{EscalationState, EscalationStateMachine};

/// How a termination sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// The child was reaped.
    Reaped {
        /// Exit code translated from the child's wait status.
        exit_code: i32,
        /// Whether SIGKILL was needed.
        forced: bool,
    },
    /// The child could not be signalled, so there was nothing to stop.
    AlreadyGone,
    /// Even SIGKILL did not get the child reaped in time.
    TimedOut,
}

/// Drives one child through SIGTERM, then SIGKILL.
#[derive(Debug)]
pub struct Escalator {
    child: Pid,
    timeout: Duration,
    machine: EscalationStateMachine,
}

impl Escalator {
    /// Create an escalator for a still-running child.
    #[must_use]
    pub fn new(child: Pid, timeout: Duration) -> Self {
        Self {
            child,
            timeout,
            machine: EscalationStateMachine::new(),
        }
    }

    /// Current escalation state.
    #[must_use]
    pub fn state(&self) -> EscalationState {
        self.machine.state()
    }

    /// Run the termination sequence to completion.
    pub async fn run(&mut self, relay: &mut SignalRelay) -> EscalationOutcome {
        if let Err(errno) = kill(self.child, Signal::SIGTERM) {
            tracing::debug!(pid = %self.child, error = %errno, "kill -TERM failed, nothing to escalate");
            return EscalationOutcome::AlreadyGone;
        }
        self.machine.transition(EscalationState::GracefulRequested);

        if let Some(status) = wait_for_reap(relay, self.child, self.timeout).await {
            self.machine.transition(EscalationState::Reaped);
            return EscalationOutcome::Reaped {
                exit_code: exit_code_for(status),
                forced: false,
            };
        }

        if let Err(errno) = kill(self.child, Signal::SIGKILL) {
            tracing::debug!(pid = %self.child, error = %errno, "kill -KILL failed, child vanished");
            return EscalationOutcome::AlreadyGone;
        }
        self.machine.transition(EscalationState::ForceRequested);

        if let Some(status) = wait_for_reap(relay, self.child, self.timeout).await {
            self.machine.transition(EscalationState::Reaped);
            return EscalationOutcome::Reaped {
                exit_code: exit_code_for(status),
                forced: true,
            };
        }

        self.machine.transition(EscalationState::TimedOut);
        tracing::warn!(pid = %self.child, "SIGKILL didn't work");
        EscalationOutcome::TimedOut
    }
}

/// Wait up to `timeout` for `child` to be reaped.
///
/// Returns `None` on timeout or when the supervisor itself is asked to
/// terminate. A final non-blocking reap covers a notification the handler
/// failed to enqueue.
async fn wait_for_reap(
    relay: &mut SignalRelay,
    child: Pid,
    timeout: Duration,
) -> Option<WaitStatus> {
    let deadline = tokio::time::sleep_until(Instant::now() + timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            event = relay.next() => match event {
                Ok(SignalEvent::ChildStateChanged) => {
                    if let Some(status) = reap_terminated(child) {
                        return Some(status);
                    }
                }
                Ok(SignalEvent::TerminateRequested(signal)) => {
                    tracing::debug!(%signal, "Terminate requested while waiting, not lingering");
                    break;
                }
                Ok(SignalEvent::Unexpected(signum)) => {
                    tracing::warn!(signum, "Unexpected signal");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Signal relay failed");
                    break;
                }
            },

            () = &mut deadline => {
                tracing::debug!(pid = %child, ?timeout, "Timed out waiting for pid");
                break;
            }
        }
    }

    reap_terminated(child)
}
