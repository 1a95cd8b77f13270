//! Supervisor module: event loop, escalation and session orchestration.

mod control;
mod escalator;
mod event_loop;
mod runner;
mod state;

pub use control::*;
pub use escalator::*;
pub use event_loop::*;
pub use runner::*;
pub use state::*;
