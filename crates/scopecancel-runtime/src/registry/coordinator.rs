//! Scope cancellation with SIGTERM → SIGKILL escalation.

use super::CancellationRegistry;
use futures_util::future::join_all;
use scopecancel_core::{
    CancelEvent, DEFAULT_GRACE_PERIOD_MS, DEFAULT_KILL_WAIT_MS, ProcessHandle, ScopeKey, Settings,
    TerminationError, TerminationOutcome,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded waits used by the termination protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationBudgets {
    /// Time a process gets to exit after the graceful request.
    pub grace: Duration,
    /// Time allowed for exit confirmation after the forceful request.
    pub kill_wait: Duration,
}

impl TerminationBudgets {
    pub const fn new(grace: Duration, kill_wait: Duration) -> Self {
        Self { grace, kill_wait }
    }

    /// Upper bound on how long one `cancel` call spends terminating.
    ///
    /// Handles are driven concurrently, so this does not grow with the
    /// number of tracked processes.
    pub const fn worst_case(&self) -> Duration {
        self.grace.saturating_add(self.kill_wait)
    }
}

impl Default for TerminationBudgets {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
            Duration::from_millis(DEFAULT_KILL_WAIT_MS),
        )
    }
}

impl From<&Settings> for TerminationBudgets {
    fn from(settings: &Settings) -> Self {
        Self::new(
            settings.effective_grace_period(),
            settings.effective_kill_wait(),
        )
    }
}

impl CancellationRegistry {
    /// Cancel everything running under `key`.
    ///
    /// # Strategy
    /// 1. Set the scope's signal (creating it if needed) so cooperative
    ///    pollers see cancellation before any process is touched
    /// 2. Snapshot the tracked processes under the lock, then release it
    /// 3. Run the termination protocol on every snapshotted handle
    ///    concurrently: SIGTERM, wait `grace`, SIGKILL, wait `kill_wait`
    ///
    /// # Returns
    /// The number of handles a termination request was issued to. This does
    /// not confirm that they exited. Never fails.
    pub async fn cancel(&self, key: &ScopeKey) -> usize {
        self.get_signal(key).set();
        self.events.broadcast(CancelEvent::signalled(key));

        let snapshot = self.snapshot(key);
        if snapshot.is_empty() {
            info!(%key, "Cancel requested, no tracked processes");
            self.events.broadcast(CancelEvent::cancelled(key, 0));
            return 0;
        }

        debug!(%key, tracked = snapshot.len(), "Terminating tracked processes");
        let budgets = self.budgets;
        let outcomes = join_all(snapshot.iter().map(|process| async move {
            let outcome = terminate_process(process.as_ref(), budgets).await;
            self.events
                .broadcast(CancelEvent::process(key, process.pid(), outcome));
            outcome
        }))
        .await;

        let stopped = outcomes
            .into_iter()
            .filter(|outcome| outcome.counts_as_stopped())
            .count();
        info!(%key, tracked = snapshot.len(), stopped, "Cancel completed");
        self.events.broadcast(CancelEvent::cancelled(key, stopped));
        stopped
    }
}

/// Run the graceful → forceful protocol against one process.
async fn terminate_process(
    process: &dyn ProcessHandle,
    budgets: TerminationBudgets,
) -> TerminationOutcome {
    let pid = process.pid();

    if process.has_exited() {
        debug!(?pid, "Process already exited");
        return TerminationOutcome::AlreadyExited;
    }

    // Phase 1: SIGTERM with grace period
    match process.terminate() {
        Ok(()) => {}
        Err(TerminationError::ProcessGone) => {
            debug!(?pid, "Process vanished before SIGTERM");
            return TerminationOutcome::Vanished;
        }
        Err(e) => {
            warn!(?pid, error = %e, "Graceful termination request failed");
            return TerminationOutcome::Failed;
        }
    }

    match process.wait_for_exit(budgets.grace).await {
        Ok(true) => {
            debug!(?pid, "Process exited after SIGTERM");
            return TerminationOutcome::Terminated;
        }
        Ok(false) => {
            // Timeout - escalate to SIGKILL
        }
        Err(e) => {
            warn!(?pid, error = %e, "Waiting for graceful exit failed");
            return TerminationOutcome::Failed;
        }
    }

    // Phase 2: SIGKILL. The request has been made either way, so failures
    // from here on only affect logging.
    debug!(?pid, grace = ?budgets.grace, "Grace period elapsed, sending SIGKILL");
    if let Err(e) = process.kill() {
        debug!(?pid, error = %e, "Forceful termination request failed");
    }

    match process.wait_for_exit(budgets.kill_wait).await {
        Ok(true) => TerminationOutcome::Killed,
        Ok(false) => {
            warn!(?pid, "Process did not confirm exit after SIGKILL");
            TerminationOutcome::KillUnconfirmed
        }
        Err(e) => {
            debug!(?pid, error = %e, "Waiting for exit after SIGKILL failed");
            TerminationOutcome::KillUnconfirmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Behavior, FakeProcess};
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn registry_with(grace_ms: u64, kill_wait_ms: u64) -> CancellationRegistry {
        CancellationRegistry::with_budgets(TerminationBudgets::new(
            Duration::from_millis(grace_ms),
            Duration::from_millis(kill_wait_ms),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_without_processes_sets_signal() {
        let registry = CancellationRegistry::new();
        let key = ScopeKey::new("render", "p1", "t1");

        assert_eq!(registry.cancel(&key).await, 0);
        assert!(registry.get_signal(&key).is_set());
        assert_eq!(registry.signal_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_is_set_before_terminate() {
        let registry = CancellationRegistry::new();
        let key = ScopeKey::new("render", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::ExitOnTerminate(Duration::from_millis(10)));
        process.observe(registry.get_signal(&key));
        registry.register_process(&key, process.shared());

        assert_eq!(registry.cancel(&key).await, 1);
        assert_eq!(process.state().signal_set_at_terminate, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_scenario() {
        let registry = CancellationRegistry::new();
        let budgets = registry.budgets();
        let key = ScopeKey::new("render", "p1", "t1");
        let a = FakeProcess::new(101, Behavior::ExitOnTerminate(Duration::from_millis(200)));
        let b = FakeProcess::new(102, Behavior::ExitOnKill);
        registry.register_process(&key, a.shared());
        registry.register_process(&key, b.shared());

        let start = Instant::now();
        let stopped = registry.cancel(&key).await;
        assert_eq!(stopped, 2);

        let a = a.state();
        assert!(a.exited_at.unwrap() - start < budgets.grace);
        assert_eq!(a.kill_calls, 0);

        let b = b.state();
        let killed_at = b.killed_at.unwrap();
        assert!(killed_at - start >= budgets.grace);
        assert!(b.exited_at.unwrap() >= killed_at);
        assert!(start.elapsed() <= budgets.worst_case());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_within_grace_skips_kill() {
        let registry = registry_with(1500, 1500);
        let key = ScopeKey::new("tts", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::ExitOnTerminate(Duration::from_millis(300)));
        registry.register_process(&key, process.shared());

        let start = Instant::now();
        assert_eq!(registry.cancel(&key).await, 1);
        assert_eq!(process.state().kill_calls, 0);
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_after_kill_is_bounded() {
        let registry = registry_with(1500, 1500);
        let budgets = registry.budgets();
        let key = ScopeKey::new("tts", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::ExitOnKill);
        registry.register_process(&key, process.shared());

        let start = Instant::now();
        assert_eq!(registry.cancel(&key).await, 1);
        let elapsed = start.elapsed();
        assert!(elapsed >= budgets.grace);
        assert!(elapsed <= budgets.worst_case());
        assert_eq!(process.state().kill_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_kill_still_counts() {
        let registry = registry_with(100, 200);
        let key = ScopeKey::new("asr", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::IgnoreAll);
        registry.register_process(&key, process.shared());

        assert_eq!(registry.cancel(&key).await, 1);
        let state = process.state();
        assert_eq!(state.kill_calls, 1);
        assert!(state.exited_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_registration_counts_once() {
        let registry = CancellationRegistry::new();
        let key = ScopeKey::new("render", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::ExitOnTerminate(Duration::from_millis(5)));
        registry.register_process(&key, process.shared());
        registry.register_process(&key, process.shared());

        assert_eq!(registry.cancel(&key).await, 1);
        assert_eq!(process.state().terminate_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_and_failed_handles_are_not_counted() {
        let registry = registry_with(100, 100);
        let key = ScopeKey::new("render", "p1", "t1");
        let exited = FakeProcess::new(1, Behavior::AlreadyExited);
        let gone = FakeProcess::new(2, Behavior::Gone);
        let denied = FakeProcess::new(3, Behavior::TerminateFails);
        let broken_wait = FakeProcess::new(4, Behavior::WaitFails);
        let healthy = FakeProcess::new(5, Behavior::ExitOnTerminate(Duration::from_millis(10)));
        for process in [&exited, &gone, &denied, &broken_wait, &healthy] {
            registry.register_process(&key, process.shared());
        }

        assert_eq!(registry.cancel(&key).await, 1);
        assert_eq!(exited.state().terminate_calls, 0);
        assert_eq!(gone.state().kill_calls, 0);
        assert_eq!(denied.state().kill_calls, 0);
        assert_eq!(broken_wait.state().kill_calls, 0);
        assert!(healthy.state().exited_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_does_not_grow_with_process_count() {
        let registry = registry_with(1500, 1500);
        let budgets = registry.budgets();
        let key = ScopeKey::new("render", "p1", "t1");
        let processes: Vec<_> = (0..8)
            .map(|pid| FakeProcess::new(pid, Behavior::IgnoreAll))
            .collect();
        for process in &processes {
            registry.register_process(&key, process.shared());
        }

        let start = Instant::now();
        assert_eq!(registry.cancel(&key).await, 8);
        let elapsed = start.elapsed();
        assert!(elapsed >= budgets.worst_case());
        assert!(elapsed < budgets.worst_case() + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cancels_on_same_key() {
        let registry = CancellationRegistry::new();
        let key = ScopeKey::new("render", "p1", "t1");
        let process = FakeProcess::new(1, Behavior::ExitOnTerminate(Duration::from_millis(100)));
        registry.register_process(&key, process.shared());

        let (first, second) = tokio::join!(registry.cancel(&key), registry.cancel(&key));
        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(process.state().terminate_calls, 2);
        assert_eq!(registry.tracked_processes(&key), 1);

        // Once exited, a further cancel skips the handle.
        assert_eq!(registry.cancel(&key).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_cancel_and_churn_keep_tables_consistent() {
        let registry = Arc::new(registry_with(20, 20));
        let mut tasks = Vec::new();

        for task in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let key = ScopeKey::new("render", "p1", format!("t{}", task % 4));
                let process = FakeProcess::new(task, Behavior::ExitOnTerminate(Duration::from_millis(1)));
                registry.register_process(&key, process.shared());
                let stopped = registry.cancel(&key).await;
                registry.unregister_process(&key, &process.shared());
                stopped
            }));
        }

        for task in tasks {
            let stopped = task.await.unwrap();
            assert!(stopped <= 16);
        }
        for task in 0..4 {
            let key = ScopeKey::new("render", "p1", format!("t{task}"));
            assert!(!registry.has_process_entry(&key));
            assert!(registry.get_signal(&key).is_set());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_broadcasts_lifecycle_events() {
        let registry = registry_with(100, 100);
        let key = ScopeKey::new("render", "p1", "t1");
        let process = FakeProcess::new(77, Behavior::ExitOnKill);
        registry.register_process(&key, process.shared());
        let mut rx = registry.subscribe();

        assert_eq!(registry.cancel(&key).await, 1);

        assert_eq!(rx.recv().await.unwrap(), CancelEvent::signalled(&key));
        assert_eq!(
            rx.recv().await.unwrap(),
            CancelEvent::process(&key, Some(77), TerminationOutcome::Killed)
        );
        assert_eq!(rx.recv().await.unwrap(), CancelEvent::cancelled(&key, 1));
    }
}
