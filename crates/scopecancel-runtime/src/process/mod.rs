//! OS process adapters for the `ProcessHandle` port.
//!
//! - `ChildProcess`: a `tokio::process::Child` spawned by the caller, with
//!   SIGTERM/SIGKILL delivered through `nix` on Unix

mod child;

pub use child::ChildProcess;
