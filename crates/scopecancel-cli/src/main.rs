//! CLI entry point - the composition root.
//!
//! This is the ONLY place where the registry is wired together via bootstrap.
//! Command dispatch routes to handlers, which all receive the `CliContext`.

use std::time::Duration;

use clap::{CommandFactory, Parser};
use scopecancel_cli::handlers::run::{self, RunRequest};
use scopecancel_cli::{Cli, CliConfig, CliContext, CliError, Commands, bootstrap, handlers};
use scopecancel_core::ScopeKey;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(ctx: &CliContext, command: Commands) -> Result<i32, CliError> {
    match command {
        Commands::Run {
            scope,
            project_id,
            task_id,
            commands,
            timeout_secs,
        } => {
            let request = RunRequest {
                key: ScopeKey::new(scope, project_id, task_id),
                commands,
                timeout: timeout_secs.map(Duration::from_secs),
            };
            let report = run::execute(ctx, request).await?;
            run::print_report(&report);
            Ok(report.exit_code())
        }
        Commands::Settings => {
            handlers::settings::execute(ctx)?;
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Bootstrap the CLI context (composition root)
    let config = match CliConfig::with_overrides(&cli.settings_update()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };
    let ctx = bootstrap(config);

    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match dispatch(&ctx, command).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
