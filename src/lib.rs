//! Childwarden - supervise one child process and never let it outlive its controller.

#[cfg(not(unix))]
compile_error!("childwarden only supports Unix platforms");

pub mod config;
pub mod process;
pub mod signal;
pub mod supervisor;
