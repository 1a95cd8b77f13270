//! Escalation state machine.

/// Current state of a termination sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscalationState {
    #[default]
    Running,
    GracefulRequested,
    ForceRequested,
    Reaped,
    TimedOut,
}

impl EscalationState {
    /// Check whether the sequence has finished.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Reaped | Self::TimedOut)
    }

    /// Check whether moving to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::GracefulRequested)
                | (Self::GracefulRequested, Self::Reaped | Self::ForceRequested)
                | (Self::ForceRequested, Self::Reaped | Self::TimedOut)
        )
    }
}

/// State machine tracking one termination sequence.
#[derive(Debug, Clone, Default)]
pub struct EscalationStateMachine {
    state: EscalationState,
    signals_sent: usize,
}

impl EscalationStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> EscalationState {
        self.state
    }

    /// Number of signals delivered to the child so far.
    #[must_use]
    pub fn signals_sent(&self) -> usize {
        self.signals_sent
    }

    pub fn transition(&mut self, new_state: EscalationState) {
        debug_assert!(
            self.state.can_transition_to(new_state),
            "illegal escalation transition {:?} -> {new_state:?}",
            self.state
        );
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        if matches!(
            new_state,
            EscalationState::GracefulRequested | EscalationState::ForceRequested
        ) {
            self.signals_sent = self.signals_sent.saturating_add(1);
        }
        self.state = new_state;
    }
}
