//! Cancellation registry and OS-level process termination.
//!
//! # Structure
//!
//! - `CancellationRegistry` - signal and process tables plus the `cancel` coordinator
//! - `ProcessRegistration` - RAII guard that unregisters a tracked process on drop
//! - `CancelEventBroadcaster` - fan-out of `CancelEvent`s to subscribers
//! - `ChildProcess` - `ProcessHandle` adapter over `tokio::process::Child`
//!
//! The registry is an explicit instance: build it once at the composition
//! root and share it through an `Arc`.

mod broadcaster;
pub mod process;
mod registry;

pub use broadcaster::CancelEventBroadcaster;
pub use process::ChildProcess;
pub use registry::{CancellationRegistry, ProcessRegistration, TerminationBudgets};

// Re-export the core types callers need alongside the registry
pub use scopecancel_core::{
    CancelEvent, CancelSignal, ProcessHandle, ScopeKey, SharedProcess, TerminationError,
    TerminationOutcome,
};
