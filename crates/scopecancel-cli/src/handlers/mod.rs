//! Command handlers.
//!
//! Each handler receives the [`CliContext`](crate::CliContext) and returns
//! a result the composition root turns into output and an exit code.

pub mod run;
pub mod settings;
