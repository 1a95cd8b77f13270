//! Supervision session.
//!
//! This module ties the pieces together: install the signal relay, spawn
//! the child, run the event loop, escalate whenever the loop returns with
//! the child possibly still running, then restore default signal handling.

use nix::unistd::Pid;

use crate::config::SupervisorConfig;
use crate::process::{ChildCommand, SpawnError, EXIT_FAILURE};
use crate::signal::{RelayError, SignalRelay};
use crate::supervisor::{run_event_loop, ControlChannel, EscalationOutcome, Escalator, LoopOutcome};

/// Error type for supervisor operations.
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// The signal relay could not be set up. Nothing was spawned.
    #[error("Failed to set up signal relay: {0}")]
    Relay(#[from] RelayError),
}

/// How the session ended before any escalation.
#[derive(Debug)]
pub enum SessionEnd {
    /// The child could not be spawned; reported like a child exiting with
    /// [`EXIT_FAILURE`].
    SpawnFailed(SpawnError),
    /// The event loop returned.
    Loop(LoopOutcome),
}

/// Result of a supervised session.
#[derive(Debug)]
pub struct SupervisionReport {
    /// Exit code the supervisor should exit with.
    pub exit_code: i32,
    /// Pid of the child, if it was spawned.
    pub pid: Option<Pid>,
    /// Why supervision ended.
    pub end: SessionEnd,
    /// Outcome of the termination sequence, if one was needed.
    pub escalation: Option<EscalationOutcome>,
}

/// Supervisor for exactly one child process.
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
    control: Option<ControlChannel>,
}

impl Supervisor {
    /// Create a supervisor that treats stdin as its controlling channel.
    #[must_use]
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            control: None,
        }
    }

    /// Create a supervisor with an explicit controlling channel.
    #[must_use]
    pub fn with_control(config: SupervisorConfig, control: ControlChannel) -> Self {
        Self {
            config,
            control: Some(control),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Run the session to completion.
    ///
    /// Must be called from within a Tokio runtime with I/O and time enabled.
    /// The child never outlives this call unless even SIGKILL fails to get
    /// it reaped, which is logged.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Relay` if signal handling cannot be set up.
    pub async fn run(self) -> Result<SupervisionReport, SupervisorError> {
        let mut relay = SignalRelay::install()?;
        let control = self.control.unwrap_or_else(ControlChannel::stdin);

        let report = Self::supervise(&self.config, &mut relay, &control).await;

        relay.uninstall();
        tracing::debug!(exit_code = report.exit_code, "Supervision finished");
        Ok(report)
    }

    async fn supervise(
        config: &SupervisorConfig,
        relay: &mut SignalRelay,
        control: &ControlChannel,
    ) -> SupervisionReport {
        let child = match ChildCommand::from_config(config).spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = ?config.program, error = %e, "Failed to run child");
                return SupervisionReport {
                    exit_code: EXIT_FAILURE,
                    pid: None,
                    end: SessionEnd::SpawnFailed(e),
                    escalation: None,
                };
            }
        };
        let pid = child.pid();
        tracing::info!(%pid, program = ?config.program, "Supervising child");

        let outcome = run_event_loop(relay, control, pid).await;

        let escalation = if outcome.child_running() {
            let mut escalator = Escalator::new(pid, config.kill_timeout());
            let result = escalator.run(relay).await;
            tracing::info!(%pid, ?result, "Escalation finished");
            Some(result)
        } else {
            None
        };

        SupervisionReport {
            exit_code: outcome.exit_code(),
            pid: Some(pid),
            end: SessionEnd::Loop(outcome),
            escalation,
        }
    }
}
