//! `ProcessHandle` adapter for `tokio::process::Child`.

use async_trait::async_trait;
use scopecancel_core::{ProcessHandle, TerminationError};
use std::io;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// A spawned child process that can be tracked by the registry.
///
/// The executor that spawned the child keeps awaiting it through
/// [`wait`](Self::wait); the registry signals it by PID. The exit status is
/// cached once observed, so whichever side reaps the child first makes it
/// visible to the other.
///
/// # Platform behavior
/// - Unix: SIGTERM / SIGKILL via the nix crate, to the whole process group
///   when spawned with [`spawn_group`](Self::spawn_group)
/// - Windows: both requests terminate immediately (no graceful equivalent).
///   While another task is inside `wait`, the request is handed to that task.
#[derive(Debug)]
pub struct ChildProcess {
    pid: Option<u32>,
    child: tokio::sync::Mutex<Child>,
    status: Mutex<Option<ExitStatus>>,
    #[cfg(unix)]
    group: bool,
    #[cfg(not(unix))]
    kill_requested: tokio::sync::Notify,
}

impl ChildProcess {
    /// Wrap an already spawned child.
    ///
    /// Take any piped stdio handles off the child before wrapping it.
    pub fn new(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: tokio::sync::Mutex::new(child),
            status: Mutex::new(None),
            #[cfg(unix)]
            group: false,
            #[cfg(not(unix))]
            kill_requested: tokio::sync::Notify::new(),
        }
    }

    /// Spawn `command` and wrap the child for sharing.
    pub fn spawn(command: &mut Command) -> io::Result<Arc<Self>> {
        Ok(Arc::new(Self::new(command.spawn()?)))
    }

    /// Spawn `command` as the leader of a new process group.
    ///
    /// Termination requests then reach everything the child forked, such as
    /// the pipeline or subshell behind an `sh -c` line. Only the leader is
    /// waited on. Outside Unix this is the same as [`spawn`](Self::spawn).
    pub fn spawn_group(command: &mut Command) -> io::Result<Arc<Self>> {
        #[cfg(unix)]
        {
            command.process_group(0);
            let mut process = Self::new(command.spawn()?);
            process.group = true;
            Ok(Arc::new(process))
        }

        #[cfg(not(unix))]
        {
            Self::spawn(command)
        }
    }

    /// Exit status, if it has been observed.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, status: ExitStatus) -> ExitStatus {
        *self
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(status)
    }

    /// Wait for the child to exit and reap it.
    ///
    /// Cancel safe: dropping the future leaves the child running and
    /// waitable.
    pub async fn wait(&self) -> io::Result<ExitStatus> {
        let mut child = self.child.lock().await;
        if let Some(status) = self.exit_status() {
            return Ok(status);
        }

        #[cfg(unix)]
        let status = child.wait().await?;

        #[cfg(not(unix))]
        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                () = self.kill_requested.notified() => {
                    if let Err(e) = child.start_kill() {
                        debug!(pid = ?self.pid, error = %e, "start_kill failed");
                    }
                }
            }
        };

        Ok(self.record(status))
    }

    #[cfg(unix)]
    fn send_signal(&self, sig: Signal) -> Result<(), TerminationError> {
        if self.exit_status().is_some() {
            return Err(TerminationError::ProcessGone);
        }
        let pid = self.pid.ok_or(TerminationError::ProcessGone)?;
        let raw = i32::try_from(pid)
            .map_err(|_| TerminationError::Signal(format!("pid {pid} out of range")))?;

        let sent = if self.group {
            signal::killpg(Pid::from_raw(raw), sig)
        } else {
            signal::kill(Pid::from_raw(raw), sig)
        };
        match sent {
            Ok(()) => Ok(()),
            // Process may have already exited
            Err(Errno::ESRCH) => Err(TerminationError::ProcessGone),
            Err(e) => Err(TerminationError::Signal(e.to_string())),
        }
    }

    #[cfg(not(unix))]
    fn start_kill(&self) -> Result<(), TerminationError> {
        if self.exit_status().is_some() {
            return Err(TerminationError::ProcessGone);
        }
        let Ok(mut child) = self.child.try_lock() else {
            // The holder is inside `wait` and kills on our behalf
            self.kill_requested.notify_one();
            return Ok(());
        };
        child.start_kill().map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput => TerminationError::ProcessGone,
            _ => TerminationError::Io(e),
        })
    }
}

#[async_trait]
impl ProcessHandle for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn has_exited(&self) -> bool {
        if self.exit_status().is_some() {
            return true;
        }
        // If someone holds the child they are awaiting it; the status will be
        // cached as soon as it exits.
        let Ok(mut child) = self.child.try_lock() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                self.record(status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(pid = ?self.pid, error = %e, "try_wait failed");
                false
            }
        }
    }

    fn terminate(&self) -> Result<(), TerminationError> {
        #[cfg(unix)]
        {
            self.send_signal(Signal::SIGTERM)
        }

        #[cfg(not(unix))]
        {
            // Windows has no SIGTERM equivalent - terminate immediately
            self.start_kill()
        }
    }

    fn kill(&self) -> Result<(), TerminationError> {
        #[cfg(unix)]
        {
            self.send_signal(Signal::SIGKILL)
        }

        #[cfg(not(unix))]
        {
            self.start_kill()
        }
    }

    async fn wait_for_exit(&self, budget: Duration) -> Result<bool, TerminationError> {
        match timeout(budget, self.wait()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(TerminationError::Io(e)),
            Err(_) => Ok(false),
        }
    }
}
