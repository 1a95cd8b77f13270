//! Signal relay turning asynchronous signals into awaitable events.

mod error;
mod event;
mod relay;

pub use error::*;
pub use event::*;
pub use relay::*;
