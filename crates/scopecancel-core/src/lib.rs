//! Core domain types and port definitions for scoped task cancellation.
//!
//! This crate holds the pieces every adapter agrees on:
//!
//! - [`ScopeKey`] - the `(scope, project_id, task_id)` triple addressing a task
//! - [`CancelSignal`] - the one-shot latch a task polls to abort cooperatively
//! - [`ProcessHandle`] - the port through which subprocesses are terminated
//! - [`CancelEvent`] - lifecycle events emitted while a scope is cancelled
//! - [`Settings`] - termination budgets and their validation
//!
//! It contains no OS process code. The registry and the `tokio::process`
//! adapter live in `scopecancel-runtime`.

pub mod events;
pub mod key;
pub mod ports;
pub mod settings;
pub mod signal;

// Re-export commonly used types for convenience
pub use events::{CancelEvent, TerminationOutcome};
pub use key::ScopeKey;
pub use ports::{ProcessHandle, SharedProcess, TerminationError};
pub use settings::{
    DEFAULT_GRACE_PERIOD_MS, DEFAULT_KILL_WAIT_MS, MAX_BUDGET_MS, Settings, SettingsError,
    SettingsUpdate, validate_settings,
};
pub use signal::CancelSignal;
