//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;
use scopecancel_core::SettingsUpdate;

use crate::commands::Commands;

/// Command-line interface for running and cancelling scoped subprocesses.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "scopecancel")]
#[command(about = "Run subprocess groups under a scope key and cancel them cleanly")]
#[command(version)]
pub struct Cli {
    /// Grace period between SIGTERM and SIGKILL, in milliseconds
    #[arg(long = "grace-ms", global = true, env = "SCOPECANCEL_GRACE_MS")]
    pub grace_ms: Option<u64>,

    /// How long to wait for exit after SIGKILL, in milliseconds
    #[arg(long = "kill-wait-ms", global = true, env = "SCOPECANCEL_KILL_WAIT_MS")]
    pub kill_wait_ms: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings overrides given on the command line or through the environment.
    pub fn settings_update(&self) -> SettingsUpdate {
        SettingsUpdate {
            grace_period_ms: self.grace_ms.map(Some),
            kill_wait_ms: self.kill_wait_ms.map(Some),
        }
    }
}
