//! Child process spawning, reaping and exit status translation.

mod launcher;
mod reap;
mod status;

pub use launcher::*;
pub use reap::*;
pub use status::*;
