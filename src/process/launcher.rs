//! Child process spawning.
//!
//! This module provides a builder for the one child process the supervisor
//! runs. The child inherits the supervisor's stdin, stdout and stderr.

use std::ffi::{OsStr, OsString};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use nix::unistd::Pid;

use crate::config::SupervisorConfig;

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The program was not found.
    #[error("Program not found: {0:?}")]
    NotFound(OsString),
    /// Permission denied when spawning.
    #[error("Permission denied: {0:?}")]
    PermissionDenied(OsString),
    /// The kernel returned a pid that does not fit a `pid_t`.
    #[error("Invalid pid {0}")]
    InvalidPid(u32),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &OsStr, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_owned()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_owned()),
            _ => Self::Io(err),
        }
    }
}

/// Builder for the supervised child.
#[derive(Debug, Clone)]
pub struct ChildCommand {
    program: OsString,
    args: Vec<OsString>,
    arg0: Option<OsString>,
}

impl ChildCommand {
    /// Create a new builder for the given program.
    ///
    /// The program is looked up in `PATH` unless it contains a slash.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            arg0: None,
        }
    }

    /// Create a builder from the supervisor configuration.
    #[must_use]
    pub fn from_config(config: &SupervisorConfig) -> Self {
        let mut command = Self::new(config.program.clone()).args(config.args.iter().cloned());
        if let Some(arg0) = &config.arg0 {
            command = command.arg0(arg0.clone());
        }
        command
    }

    /// Append arguments, not including argv[0].
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the program name the child sees as argv[0].
    #[must_use]
    pub fn arg0(mut self, arg0: impl Into<OsString>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    /// Get the program.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Build the full argument vector the child will see, argv[0] included.
    #[must_use]
    pub fn build_argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.arg0.clone().unwrap_or_else(|| self.program.clone()));
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Spawn the child.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the program cannot be executed.
    pub fn spawn(&self) -> Result<ChildHandle, SpawnError> {
        tracing::debug!(program = ?self.program, argv = ?self.build_argv(), "Running child");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(arg0) = &self.arg0 {
            cmd.arg0(arg0);
        }

        let child = cmd
            .spawn()
            .map_err(|e| SpawnError::from_io(&self.program, e))?;
        let raw = child.id();
        let pid = i32::try_from(raw).map_err(|_| SpawnError::InvalidPid(raw))?;

        Ok(ChildHandle {
            pid: Pid::from_raw(pid),
        })
    }
}

/// The one outstanding child.
///
/// Holds only the pid: the child is reaped through the relay-driven
/// `waitpid` path, never through `std::process::Child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildHandle {
    pid: Pid,
}

impl ChildHandle {
    /// Get the process ID.
    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }
}
