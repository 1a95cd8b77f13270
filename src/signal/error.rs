//! Signal relay error types.

use nix::errno::Errno;
use nix::sys::signal::Signal;

/// Errors that can occur while setting up or reading the signal relay.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    /// Another relay already owns the process-wide handlers.
    #[error("Signal relay already installed")]
    AlreadyInstalled,

    /// The notification pipe could not be created.
    #[error("Failed to create signal pipe: {0}")]
    Pipe(#[source] Errno),

    /// The notification pipe could not be configured (platforms without pipe2).
    #[error("Failed to configure signal pipe: {0}")]
    Fcntl(#[source] Errno),

    /// A handler could not be installed.
    #[error("Failed to install handler for {signal}: {source}")]
    Sigaction {
        signal: Signal,
        #[source]
        source: Errno,
    },

    /// The pipe could not be registered with the reactor.
    #[error("Failed to register signal pipe: {0}")]
    Register(#[source] std::io::Error),

    /// Reading a notification failed.
    #[error("Failed to read signal pipe: {0}")]
    Read(#[source] std::io::Error),
}
