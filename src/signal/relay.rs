//! Self-pipe signal relay.
//!
//! A single handler is installed for every signal in [`RELAYED_SIGNALS`]. It
//! writes the signal number into a non-blocking, close-on-exec pipe and does
//! nothing else. The read end is registered with the Tokio reactor, so signal
//! arrival becomes ordinary I/O readiness that can be multiplexed with other
//! wait sources in one `select!`.
//!
//! Handlers and the pipe are process-wide, so at most one [`SignalRelay`] may
//! exist at a time.

// sigaction(2) and write(2) from a signal handler have no safe wrapper.
#![allow(unsafe_code)]

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc::{self, c_int};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tokio::io::unix::AsyncFd;

use super::{RelayError, SignalEvent, RELAYED_SIGNALS};

/// Set while a relay owns the handlers.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Write end of the pipe, or -1 when no relay is installed.
static WRITE_FD: AtomicI32 = AtomicI32::new(-1);

/// Notifications the handler failed to enqueue.
static DROPPED: AtomicUsize = AtomicUsize::new(0);

/// Signal handler. Only touches atomics, `errno` and write(2).
extern "C" fn relay_signal(signum: c_int) {
    let fd = WRITE_FD.load(Ordering::Acquire);
    if fd < 0 {
        return;
    }

    let saved_errno = Errno::last_raw();
    let bytes = signum.to_ne_bytes();
    // SAFETY: write(2) is async-signal-safe and `bytes` outlives the call.
    let written = unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
    if usize::try_from(written).ok() != Some(bytes.len()) {
        DROPPED.fetch_add(1, Ordering::Relaxed);
    }
    Errno::set_raw(saved_errno);
}

/// Process-wide relay of SIGCHLD, SIGINT, SIGQUIT and SIGTERM.
///
/// Dropping the relay restores the default disposition of every relayed
/// signal.
#[derive(Debug)]
pub struct SignalRelay {
    reader: AsyncFd<File>,
    writer: Option<OwnedFd>,
    installed: bool,
}

impl SignalRelay {
    /// Create the notification pipe and install the handlers.
    ///
    /// Must be called from within a Tokio runtime with I/O enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::AlreadyInstalled`] if another relay is alive, or
    /// the underlying error if the pipe or a handler cannot be set up.
    pub fn install() -> Result<Self, RelayError> {
        if INSTALLED.swap(true, Ordering::AcqRel) {
            return Err(RelayError::AlreadyInstalled);
        }

        Self::setup().inspect_err(|_| INSTALLED.store(false, Ordering::Release))
    }

    fn setup() -> Result<Self, RelayError> {
        let (read_end, write_end) = create_pipe()?;

        let reader = AsyncFd::new(File::from(read_end)).map_err(RelayError::Register)?;

        DROPPED.store(0, Ordering::Relaxed);
        WRITE_FD.store(write_end.as_raw_fd(), Ordering::Release);

        let mut relay = Self {
            reader,
            writer: Some(write_end),
            installed: true,
        };

        for signal in RELAYED_SIGNALS {
            let action = SigAction::new(
                SigHandler::Handler(relay_signal),
                handler_flags(signal),
                SigSet::empty(),
            );
            // SAFETY: `relay_signal` only performs async-signal-safe work.
            if let Err(source) = unsafe { sigaction(signal, &action) } {
                relay.uninstall();
                return Err(RelayError::Sigaction { signal, source });
            }
        }

        tracing::debug!(signals = ?RELAYED_SIGNALS, "Signal relay installed");
        Ok(relay)
    }

    /// Wait for the next relayed signal.
    ///
    /// Cancel safe: if the returned future is dropped before completion, no
    /// notification is consumed.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Read`] if the pipe cannot be read.
    pub async fn next(&mut self) -> Result<SignalEvent, RelayError> {
        loop {
            let mut guard = self.reader.readable().await.map_err(RelayError::Read)?;

            match guard.try_io(|inner| read_signal_number(inner.get_ref())) {
                Ok(Ok(signum)) => {
                    self.report_dropped();
                    let event = SignalEvent::from_raw(signum);
                    tracing::trace!(signum, ?event, "Relayed signal");
                    return Ok(event);
                }
                Ok(Err(err)) => return Err(RelayError::Read(err)),
                Err(_would_block) => {}
            }
        }
    }

    /// Restore the default disposition of every relayed signal and close the
    /// write end of the pipe. Calling this more than once is a no-op.
    pub fn uninstall(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;

        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        for signal in RELAYED_SIGNALS {
            // SAFETY: restoring SIG_DFL installs no handler code.
            if let Err(errno) = unsafe { sigaction(signal, &default) } {
                tracing::warn!(%signal, error = %errno, "Failed to restore default signal handler");
            }
        }

        WRITE_FD.store(-1, Ordering::Release);
        self.writer = None;
        self.report_dropped();
        INSTALLED.store(false, Ordering::Release);

        tracing::debug!("Signal relay uninstalled");
    }

    /// Check whether this relay still owns the handlers.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    fn report_dropped(&self) {
        let dropped = DROPPED.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(dropped, "write(signal_pipe) failed, notifications lost");
        }
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn handler_flags(signal: Signal) -> SaFlags {
    match signal {
        Signal::SIGCHLD => SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        _ => SaFlags::SA_RESTART,
    }
}

/// Create the notification pipe, close-on-exec and non-blocking on both ends.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "illumos",
    target_os = "solaris"
))]
fn create_pipe() -> Result<(OwnedFd, OwnedFd), RelayError> {
    nix::unistd::pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK).map_err(RelayError::Pipe)
}

/// Create the notification pipe, close-on-exec and non-blocking on both ends.
///
/// No pipe2(2) here, so the flags are set after the fact.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "illumos",
    target_os = "solaris"
)))]
fn create_pipe() -> Result<(OwnedFd, OwnedFd), RelayError> {
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};

    let (read_end, write_end) = nix::unistd::pipe().map_err(RelayError::Pipe)?;
    for fd in [read_end.as_raw_fd(), write_end.as_raw_fd()] {
        fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(RelayError::Fcntl)?;
        let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(RelayError::Fcntl)?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(RelayError::Fcntl)?;
    }
    Ok((read_end, write_end))
}

/// Read one signal number. Writes of `i32` are below `PIPE_BUF`, so a
/// notification is never split.
fn read_signal_number(mut pipe: &File) -> io::Result<i32> {
    let mut buf = [0u8; std::mem::size_of::<c_int>()];
    loop {
        match pipe.read(&mut buf) {
            Ok(n) if n == buf.len() => return Ok(i32::from_ne_bytes(buf)),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "signal pipe closed",
                ))
            }
            Ok(n) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("short read of {n} bytes from signal pipe"),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
