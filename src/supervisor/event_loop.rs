//! The supervision event loop.
//!
//! Blocks on two sources at once: the signal relay and the controlling
//! channel. It has one normal exit (the tracked child was reaped) and
//! several abnormal ones, all of which leave the child possibly running.

use nix::unistd::Pid;

use crate::process::{exit_code_for, reap_terminated, EXIT_FAILURE};
use crate::signal::{RelayError, SignalEvent, SignalRelay, TerminateSignal};
use crate::supervisor::ControlChannel;

/// Why the event loop returned.
#[derive(Debug)]
pub enum LoopOutcome {
    /// The tracked child was reaped.
    ChildExited {
        /// Exit code translated from the child's wait status.
        exit_code: i32,
    },
    /// The controlling channel was closed by its peer.
    ControlClosed,
    /// The supervisor itself was asked to terminate.
    TerminateRequested(TerminateSignal),
    /// The relay produced a number it does not relay.
    UnexpectedSignal(i32),
    /// The relay could not be read.
    RelayFailed(RelayError),
}

impl LoopOutcome {
    /// Check whether the child may still be running and must be escalated.
    #[must_use]
    pub fn child_running(&self) -> bool {
        !matches!(self, Self::ChildExited { .. })
    }

    /// Exit code the supervisor reports for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ChildExited { exit_code } => *exit_code,
            _ => EXIT_FAILURE,
        }
    }
}

/// Supervise `child` until it is reaped or supervision must stop.
///
/// A notification already queued on the relay is preferred over a
/// simultaneous hang-up, so a child that exited on its own reports its real
/// exit code.
pub async fn run_event_loop(
    relay: &mut SignalRelay,
    control: &ControlChannel,
    child: Pid,
) -> LoopOutcome {
    loop {
        tokio::select! {
            biased;

            event = relay.next() => match event {
                Ok(SignalEvent::ChildStateChanged) => {
                    if let Some(status) = reap_terminated(child) {
                        return LoopOutcome::ChildExited {
                            exit_code: exit_code_for(status),
                        };
                    }
                }
                Ok(SignalEvent::TerminateRequested(signal)) => {
                    tracing::info!(%signal, "Terminate requested, stopping supervision");
                    return LoopOutcome::TerminateRequested(signal);
                }
                Ok(SignalEvent::Unexpected(signum)) => {
                    tracing::warn!(signum, "Unexpected signal");
                    return LoopOutcome::UnexpectedSignal(signum);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Signal relay failed");
                    return LoopOutcome::RelayFailed(e);
                }
            },

            () = control.closed() => {
                tracing::info!("stdin closed, cleaning up");
                return LoopOutcome::ControlClosed;
            }
        }
    }
}
