//! CLI adapter for scopecancel.
//!
//! `main.rs` is the composition root: it parses arguments, builds a
//! [`CliContext`] through [`bootstrap`], and dispatches to [`handlers`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;

// Used by main.rs binary
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;
