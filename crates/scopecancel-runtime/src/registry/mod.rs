//! Scope-keyed cancellation registry.
//!
//! The registry owns two tables behind one mutex:
//!
//! - the signal table, `ScopeKey -> CancelSignal`, created lazily
//! - the process table, `ScopeKey -> {ProcessHandle}`, present only while non-empty
//!
//! # Locking
//!
//! The mutex is a plain `std::sync::Mutex` and is not reentrant. Every public
//! method takes it for a short synchronous section and releases it before
//! returning; no method calls another registry method while holding it, and
//! it is never held across an `.await`. `cancel` fetches its signal through
//! `get_signal` first and only then takes the lock for its snapshot.

mod coordinator;
mod guard;
mod tables;
#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::TerminationBudgets;
pub use guard::ProcessRegistration;

use crate::broadcaster::CancelEventBroadcaster;
use scopecancel_core::{CancelEvent, CancelSignal, ScopeKey, Settings, SharedProcess};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tables::Tables;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Registry of cancellation signals and tracked subprocesses.
///
/// Build one per process at startup and share it (usually as
/// `Arc<CancellationRegistry>`) with request handlers and task executors.
#[derive(Debug)]
pub struct CancellationRegistry {
    tables: Mutex<Tables>,
    budgets: TerminationBudgets,
    events: CancelEventBroadcaster,
}

impl CancellationRegistry {
    /// Create a registry with the default 1.5 s / 1.5 s budgets.
    pub fn new() -> Self {
        Self::with_budgets(TerminationBudgets::default())
    }

    /// Create a registry with explicit termination budgets.
    pub fn with_budgets(budgets: TerminationBudgets) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            budgets,
            events: CancelEventBroadcaster::new(),
        }
    }

    /// Create a registry from validated settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_budgets(TerminationBudgets::from(settings))
    }

    pub const fn budgets(&self) -> TerminationBudgets {
        self.budgets
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Table updates are single inserts/removes, so a poisoned lock still
        // guards consistent maps.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signal for `key`, created unset on first reference.
    ///
    /// The same key yields the same signal instance until [`release`](Self::release).
    pub fn get_signal(&self, key: &ScopeKey) -> CancelSignal {
        self.lock().signal(key)
    }

    /// Track `process` under `key`.
    ///
    /// Passing `None` is a no-op; registering an already tracked handle is
    /// idempotent.
    pub fn register_process(&self, key: &ScopeKey, process: impl Into<Option<SharedProcess>>) {
        let Some(process) = process.into() else {
            return;
        };
        let pid = process.pid();
        if self.lock().insert_process(key, process) {
            debug!(%key, ?pid, "Tracking process");
        } else {
            trace!(%key, ?pid, "Process already tracked");
        }
    }

    /// Stop tracking `process` under `key`.
    ///
    /// Unknown keys and handles are ignored. Removing the last handle removes
    /// the key's process entry.
    pub fn unregister_process(&self, key: &ScopeKey, process: &SharedProcess) {
        if self.lock().remove_process(key, process) {
            debug!(%key, pid = ?process.pid(), "Stopped tracking process");
        }
    }

    /// Track `process` under `key` until the returned guard is dropped.
    #[must_use = "dropping the registration unregisters the process immediately"]
    pub fn track(self: &Arc<Self>, key: &ScopeKey, process: SharedProcess) -> ProcessRegistration {
        self.register_process(key, Arc::clone(&process));
        ProcessRegistration::new(Arc::clone(self), key.clone(), process)
    }

    /// Drop the signal entry for `key`.
    ///
    /// Called by the task executor once the task has fully finished. Holders
    /// of the old signal keep a valid (possibly set) latch; the next
    /// `get_signal` for `key` creates a fresh, unset one. Tracked processes
    /// are unaffected. Returns whether an entry existed.
    pub fn release(&self, key: &ScopeKey) -> bool {
        let removed = self.lock().remove_signal(key);
        if removed {
            debug!(%key, "Released cancel signal");
        }
        removed
    }

    /// Number of processes currently tracked under `key`.
    pub fn tracked_processes(&self, key: &ScopeKey) -> usize {
        self.lock().process_count(key)
    }

    /// Whether the process table holds an entry for `key`.
    pub fn has_process_entry(&self, key: &ScopeKey) -> bool {
        self.lock().has_process_entry(key)
    }

    /// Number of live signal table entries.
    pub fn signal_count(&self) -> usize {
        self.lock().signal_count()
    }

    /// Subscribe to cancellation events.
    pub fn subscribe(&self) -> broadcast::Receiver<CancelEvent> {
        self.events.subscribe()
    }

    fn snapshot(&self, key: &ScopeKey) -> Vec<SharedProcess> {
        self.lock().snapshot(key)
    }
}

impl Default for CancellationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
