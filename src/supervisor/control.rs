//! The controlling input channel.
//!
//! The only meaningful event on this channel is a hang-up. Data is never
//! read, so the child keeps sole use of any bytes written to stdin.

use std::io::Stdin;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use tokio::io::unix::AsyncFd;
use tokio::io::Interest;

/// File descriptor behind a control channel.
#[derive(Debug)]
enum ControlFd {
    Stdin(Stdin),
    Owned(OwnedFd),
}

impl AsRawFd for ControlFd {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Self::Stdin(stdin) => stdin.as_raw_fd(),
            Self::Owned(fd) => fd.as_raw_fd(),
        }
    }
}

/// Channel whose closure by its peer means the controller is gone.
#[derive(Debug)]
pub struct ControlChannel {
    fd: Option<AsyncFd<ControlFd>>,
}

impl ControlChannel {
    /// Watch the process's standard input.
    ///
    /// Must be called from within a Tokio runtime with I/O enabled. If stdin
    /// cannot be watched (a regular file, `/dev/null`, a closed descriptor)
    /// the channel never reports closure.
    #[must_use]
    pub fn stdin() -> Self {
        Self::watch(ControlFd::Stdin(std::io::stdin()))
    }

    /// Watch an arbitrary descriptor, typically the read end of a pipe.
    #[must_use]
    pub fn from_fd(fd: OwnedFd) -> Self {
        Self::watch(ControlFd::Owned(fd))
    }

    /// A channel that never closes.
    #[must_use]
    pub fn detached() -> Self {
        Self { fd: None }
    }

    fn watch(fd: ControlFd) -> Self {
        let raw = fd.as_raw_fd();
        match AsyncFd::with_interest(fd, Interest::READABLE) {
            Ok(fd) => Self { fd: Some(fd) },
            Err(e) => {
                tracing::debug!(fd = raw, error = %e, "Controlling channel cannot be watched");
                Self::detached()
            }
        }
    }

    /// Check whether this channel can ever report closure.
    #[must_use]
    pub fn is_watched(&self) -> bool {
        self.fd.is_some()
    }

    /// Resolve once the peer has closed the channel.
    ///
    /// Cancel safe.
    pub async fn closed(&self) {
        let Some(fd) = &self.fd else {
            return std::future::pending().await;
        };

        loop {
            match fd.ready(Interest::READABLE).await {
                Ok(mut guard) => {
                    if guard.ready().is_read_closed() {
                        return;
                    }
                    // Readable data only. Leave it for the child.
                    guard.clear_ready();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "poll(stdin) failed, no longer watching");
                    return std::future::pending().await;
                }
            }
        }
    }
}
