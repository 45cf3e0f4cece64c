//! Settings domain types and validation.
//!
//! This module contains the termination budgets used by the cancellation
//! coordinator. These are pure domain types with no infrastructure
//! dependencies; adapters decide where the values come from (CLI flags,
//! environment, a settings file).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default grace budget between SIGTERM and SIGKILL, in milliseconds.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 1500;

/// Default budget for confirming exit after SIGKILL, in milliseconds.
pub const DEFAULT_KILL_WAIT_MS: u64 = 1500;

/// Upper bound accepted for either budget, in milliseconds.
pub const MAX_BUDGET_MS: u64 = 300_000;

/// Cancellation settings.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// How long a process gets to exit after the graceful request.
    pub grace_period_ms: Option<u64>,

    /// How long to wait for exit confirmation after the forceful request.
    pub kill_wait_ms: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            grace_period_ms: Some(DEFAULT_GRACE_PERIOD_MS),
            kill_wait_ms: Some(DEFAULT_KILL_WAIT_MS),
        }
    }

    /// Get the effective grace budget (with default fallback).
    #[must_use]
    pub const fn effective_grace_period(&self) -> Duration {
        match self.grace_period_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
        }
    }

    /// Get the effective post-kill wait budget (with default fallback).
    #[must_use]
    pub const fn effective_kill_wait(&self) -> Duration {
        match self.kill_wait_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_millis(DEFAULT_KILL_WAIT_MS),
        }
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(grace) = other.grace_period_ms {
            self.grace_period_ms = grace;
        }
        if let Some(wait) = other.kill_wait_ms {
            self.kill_wait_ms = wait;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub grace_period_ms: Option<Option<u64>>,
    pub kill_wait_ms: Option<Option<u64>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be between 1 and {max} ms, got {value}")]
    InvalidBudget {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    check_budget("grace_period_ms", settings.grace_period_ms)?;
    check_budget("kill_wait_ms", settings.kill_wait_ms)?;
    Ok(())
}

fn check_budget(field: &'static str, value: Option<u64>) -> Result<(), SettingsError> {
    match value {
        Some(ms) if ms == 0 || ms > MAX_BUDGET_MS => Err(SettingsError::InvalidBudget {
            field,
            value: ms,
            max: MAX_BUDGET_MS,
        }),
        _ => Ok(()),
    }
}
