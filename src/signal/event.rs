//! Events produced by the signal relay.

use std::fmt;

use nix::sys::signal::Signal;

/// Signals the relay listens for.
pub const RELAYED_SIGNALS: [Signal; 4] = [
    Signal::SIGCHLD,
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTERM,
];

/// A request, addressed to the supervisor itself, to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateSignal {
    /// SIGINT.
    Interrupt,
    /// SIGQUIT.
    Quit,
    /// SIGTERM.
    Terminate,
}

impl TerminateSignal {
    /// The OS signal this request arrived as.
    #[must_use]
    pub fn signal(self) -> Signal {
        match self {
            Self::Interrupt => Signal::SIGINT,
            Self::Quit => Signal::SIGQUIT,
            Self::Terminate => Signal::SIGTERM,
        }
    }
}

impl fmt::Display for TerminateSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signal().as_str())
    }
}

/// One relayed asynchronous condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// SIGCHLD: at least one child changed state and may be reapable.
    ChildStateChanged,
    /// The supervisor was asked to terminate.
    TerminateRequested(TerminateSignal),
    /// A number that does not belong to any relayed signal.
    Unexpected(i32),
}

impl SignalEvent {
    /// Decode the raw signal number written by the handler.
    #[must_use]
    pub fn from_raw(signum: i32) -> Self {
        match Signal::try_from(signum) {
            Ok(Signal::SIGCHLD) => Self::ChildStateChanged,
            Ok(Signal::SIGINT) => Self::TerminateRequested(TerminateSignal::Interrupt),
            Ok(Signal::SIGQUIT) => Self::TerminateRequested(TerminateSignal::Quit),
            Ok(Signal::SIGTERM) => Self::TerminateRequested(TerminateSignal::Terminate),
            _ => Self::Unexpected(signum),
        }
    }
}
