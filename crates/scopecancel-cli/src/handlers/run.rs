//! Run command handler.
//!
//! Spawns every command under one scope key, tracks each child in the
//! registry for as long as its executor waits on it, and cancels the whole
//! scope on Ctrl-C or when the timeout elapses.

use std::fmt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use scopecancel_core::ScopeKey;
use scopecancel_runtime::{ChildProcess, SharedProcess};
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// What to run and under which key.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub key: ScopeKey,
    pub commands: Vec<String>,
    pub timeout: Option<Duration>,
}

/// How a single command ended.
#[derive(Debug)]
pub struct CommandOutcome {
    pub command: String,
    /// `None` if the child could not be waited on.
    pub status: Option<ExitStatus>,
}

impl CommandOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.is_some_and(|status| status.success())
    }
}

/// What triggered cancellation of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    TimedOut,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct RunReport {
    pub key: ScopeKey,
    pub finished: Vec<CommandOutcome>,
    /// Whether the scope was cancelled before every command finished.
    pub cancelled: bool,
    /// Set when Ctrl-C or the timeout cancelled the run.
    pub reason: Option<StopReason>,
    /// Processes the cancellation stopped.
    pub stopped: usize,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.finished.iter().all(CommandOutcome::succeeded)
    }

    /// 0 when every command succeeded without cancellation, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.cancelled || !self.all_succeeded())
    }
}

/// A command line and the process that runs it.
struct PreparedCommand {
    line: String,
    command: Command,
}

fn shell_command(line: &str) -> PreparedCommand {
    #[cfg(unix)]
    let mut command = {
        let mut command = Command::new("sh");
        command.arg("-c").arg(line);
        command
    };
    #[cfg(not(unix))]
    let mut command = {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(line);
        command
    };
    command.kill_on_drop(true);
    PreparedCommand {
        line: line.to_string(),
        command,
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Resolves once the run should be cancelled.
async fn stop_requested(
    timeout: Option<Duration>,
    interrupt: impl Future<Output = ()>,
) -> StopReason {
    let deadline = async {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        () = interrupt => StopReason::Interrupted,
        () = deadline => StopReason::TimedOut,
    }
}

/// Execute the run command.
pub async fn execute(ctx: &CliContext, request: RunRequest) -> Result<RunReport, CliError> {
    let RunRequest {
        key,
        commands,
        timeout,
    } = request;
    let prepared = commands.iter().map(|line| shell_command(line)).collect();
    run_until(ctx, key, prepared, timeout, ctrl_c()).await
}

async fn run_until(
    ctx: &CliContext,
    key: ScopeKey,
    commands: Vec<PreparedCommand>,
    timeout: Option<Duration>,
    interrupt: impl Future<Output = ()>,
) -> Result<RunReport, CliError> {
    let registry = &ctx.registry;
    let signal = registry.get_signal(&key);

    let mut executors = JoinSet::new();
    for PreparedCommand { line, mut command } in commands {
        if signal.is_set() {
            warn!(%key, command = %line, "Scope already cancelled; not starting command");
            break;
        }
        let process = match ChildProcess::spawn_group(&mut command) {
            Ok(process) => process,
            Err(e) => {
                // Children that did start must not outlive the failed run
                let stopped = registry.cancel(&key).await;
                executors.shutdown().await;
                registry.release(&key);
                warn!(%key, command = %line, stopped, "Spawn failed; scope cancelled");
                return Err(CliError::Process(format!("failed to spawn `{line}`: {e}")));
            }
        };
        let handle: SharedProcess = Arc::clone(&process) as SharedProcess;
        info!(%key, pid = ?handle.pid(), command = %line, "Started command");

        let registration = registry.track(&key, handle);
        executors.spawn(async move {
            let status = process.wait().await;
            drop(registration);
            let status = match status {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(command = %line, error = %e, "Failed to wait for command");
                    None
                }
            };
            CommandOutcome {
                command: line,
                status,
            }
        });
    }

    let stop = stop_requested(timeout, interrupt);
    tokio::pin!(stop);
    let mut reason = None;
    let mut stopped = 0;
    let mut finished = Vec::with_capacity(executors.len());
    loop {
        tokio::select! {
            joined = executors.join_next() => match joined {
                Some(Ok(outcome)) => finished.push(outcome),
                Some(Err(e)) => warn!(error = %e, "Executor task failed"),
                None => break,
            },
            why = &mut stop, if reason.is_none() => {
                info!(%key, reason = %why, "Cancelling scope");
                reason = Some(why);
                stopped = registry.cancel(&key).await;
            }
        }
    }

    let cancelled = reason.is_some() || signal.is_set();
    registry.release(&key);

    Ok(RunReport {
        key,
        finished,
        cancelled,
        reason,
        stopped,
    })
}

/// Print a human-readable summary of `report`.
pub fn print_report(report: &RunReport) {
    for outcome in &report.finished {
        match outcome.status {
            Some(status) => println!("{status}: {}", outcome.command),
            None => println!("unknown status: {}", outcome.command),
        }
    }
    match (report.cancelled, report.reason) {
        (true, Some(reason)) => println!(
            "Cancelled {} ({reason}): stopped {} process(es)",
            report.key, report.stopped
        ),
        (true, None) => println!("Cancelled {}: nothing started", report.key),
        (false, _) => {}
    }
}
