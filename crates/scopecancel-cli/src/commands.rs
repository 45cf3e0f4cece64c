use clap::Subcommand;

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run shell commands under one scope key; Ctrl-C or the timeout cancels them
    Run {
        /// Scope name (e.g. render, tts, asr)
        #[arg(long)]
        scope: String,
        /// Project identifier
        #[arg(long = "project", default_value = "")]
        project_id: String,
        /// Task identifier
        #[arg(long = "task", default_value = "")]
        task_id: String,
        /// Shell command to run; repeat for several processes in one scope
        #[arg(long = "cmd", required = true)]
        commands: Vec<String>,
        /// Cancel the scope after this many seconds
        #[arg(long = "timeout-secs")]
        timeout_secs: Option<u64>,
    },
    /// Print the effective cancellation settings as JSON
    Settings,
}
