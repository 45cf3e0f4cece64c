//! Process handle port.
//!
//! The registry never spawns processes. Whoever spawns one wraps it in a
//! [`ProcessHandle`] and registers it; the registry only ever asks the four
//! questions below.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Shared, type-erased process handle as stored by the registry.
///
/// Identity is the allocation: registering the same `Arc` twice is a no-op,
/// while two separate `Arc`s wrapping the same PID are two handles.
pub type SharedProcess = Arc<dyn ProcessHandle>;

/// Errors reported by a [`ProcessHandle`].
#[derive(Debug, Error)]
pub enum TerminationError {
    /// The OS process no longer exists (or was never observable).
    #[error("process is gone")]
    ProcessGone,

    /// Signal delivery failed for another reason (e.g. permissions).
    #[error("failed to signal process: {0}")]
    Signal(String),

    /// Waiting on or reaping the process failed.
    #[error("process I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The platform or handle cannot perform the request.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Narrow capability interface over a live subprocess.
///
/// Implementations must be cheap to call concurrently: two `cancel` calls on
/// the same scope may drive the same handle at once.
#[async_trait]
pub trait ProcessHandle: Send + Sync + fmt::Debug {
    /// OS process id, when known. Used for logging and events only.
    fn pid(&self) -> Option<u32>;

    /// Whether an exit status is already observable. Must not block.
    fn has_exited(&self) -> bool;

    /// Request graceful termination (SIGTERM on Unix).
    ///
    /// Returns [`TerminationError::ProcessGone`] when the process no longer
    /// exists.
    fn terminate(&self) -> Result<(), TerminationError>;

    /// Request forceful termination (SIGKILL on Unix).
    fn kill(&self) -> Result<(), TerminationError>;

    /// Wait up to `budget` for the process to exit.
    ///
    /// `Ok(true)` once exited, `Ok(false)` if the budget elapsed first.
    async fn wait_for_exit(&self, budget: Duration) -> Result<bool, TerminationError>;
}
