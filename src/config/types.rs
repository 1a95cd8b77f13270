//! Configuration types.

use std::ffi::OsString;
use std::time::Duration;

/// Default delay between SIGTERM and SIGKILL, in milliseconds.
pub const DEFAULT_DELAY_TO_SIGKILL_MS: u64 = 500;

/// Immutable configuration of one supervision session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// How long each escalation stage waits for the child to be reaped.
    pub delay_to_sigkill_ms: u64,
    /// Program to run, looked up in `PATH` unless it contains a slash.
    pub program: OsString,
    /// Arguments after argv[0].
    pub args: Vec<OsString>,
    /// Override of the child's argv[0].
    pub arg0: Option<OsString>,
}

impl SupervisorConfig {
    /// Create a configuration for `program` with default settings.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            delay_to_sigkill_ms: DEFAULT_DELAY_TO_SIGKILL_MS,
            program: program.into(),
            args: Vec::new(),
            arg0: None,
        }
    }

    /// Set the child's arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Override the child's argv[0].
    #[must_use]
    pub fn with_arg0(mut self, arg0: impl Into<OsString>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    /// Set the delay between SIGTERM and SIGKILL.
    #[must_use]
    pub fn with_delay_to_sigkill_ms(mut self, ms: u64) -> Self {
        self.delay_to_sigkill_ms = ms;
        self
    }

    /// The per-stage escalation timeout.
    #[must_use]
    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.delay_to_sigkill_ms)
    }
}
