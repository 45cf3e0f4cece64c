//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `tokio::process` or `nix` types in any signature
//! - Capabilities are minimal: only what the termination protocol needs

pub mod process_handle;

pub use process_handle::{ProcessHandle, SharedProcess, TerminationError};
