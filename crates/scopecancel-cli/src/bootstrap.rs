//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the cancellation registry is built
//! for the CLI adapter. Command handlers receive it through [`CliContext`].

use std::sync::Arc;

use scopecancel_core::{Settings, SettingsUpdate, validate_settings};
use scopecancel_runtime::CancellationRegistry;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Validated cancellation settings.
    pub settings: Settings,
}

impl CliConfig {
    /// Defaults overlaid with `overrides`, validated.
    pub fn with_overrides(overrides: &SettingsUpdate) -> Result<Self, CliError> {
        let mut settings = Settings::with_defaults();
        settings.merge(overrides);
        validate_settings(&settings)?;
        Ok(Self { settings })
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Shared registry for every scope this invocation runs.
    pub registry: Arc<CancellationRegistry>,
    /// Settings the registry was built from.
    pub settings: Settings,
}

/// Wire the registry from configuration.
pub fn bootstrap(config: CliConfig) -> CliContext {
    let registry = Arc::new(CancellationRegistry::from_settings(&config.settings));
    tracing::debug!(budgets = ?registry.budgets(), "Cancellation registry ready");
    CliContext {
        registry,
        settings: config.settings,
    }
}
