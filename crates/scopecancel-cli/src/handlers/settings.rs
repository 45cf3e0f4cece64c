//! Settings command handler.

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Render the effective settings as pretty JSON.
pub fn render(ctx: &CliContext) -> Result<String, CliError> {
    serde_json::to_string_pretty(&ctx.settings).map_err(|e| CliError::Io(e.to_string()))
}

/// Execute the settings command.
pub fn execute(ctx: &CliContext) -> Result<(), CliError> {
    println!("{}", render(ctx)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CliConfig, bootstrap};
    use scopecancel_core::SettingsUpdate;

    #[test]
    fn test_render_shows_effective_budgets() {
        let overrides = SettingsUpdate {
            grace_period_ms: Some(Some(400)),
            kill_wait_ms: None,
        };
        let ctx = bootstrap(CliConfig::with_overrides(&overrides).unwrap());
        let json: serde_json::Value = serde_json::from_str(&render(&ctx).unwrap()).unwrap();
        assert_eq!(json["grace_period_ms"], 400);
        assert_eq!(json["kill_wait_ms"], 1500);
    }
}
