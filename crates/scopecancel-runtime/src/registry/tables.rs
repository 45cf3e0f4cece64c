//! Signal and process tables.
//!
//! Both maps live in one [`Tables`] value guarded by a single mutex in the
//! registry. Methods here are plain synchronous bookkeeping; they never
//! block or call back into the registry.

use scopecancel_core::{CancelSignal, ScopeKey, SharedProcess};
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Process handle compared and hashed by allocation.
#[derive(Debug, Clone)]
struct TrackedProcess(SharedProcess);

impl TrackedProcess {
    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl PartialEq for TrackedProcess {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for TrackedProcess {}

impl Hash for TrackedProcess {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

/// Scope-keyed signal and process bookkeeping.
///
/// Invariant: no key in `processes` maps to an empty set.
#[derive(Debug, Default)]
pub(super) struct Tables {
    signals: HashMap<ScopeKey, CancelSignal>,
    processes: HashMap<ScopeKey, HashSet<TrackedProcess>>,
}

impl Tables {
    /// Existing signal for `key`, created on first reference.
    pub(super) fn signal(&mut self, key: &ScopeKey) -> CancelSignal {
        if let Some(signal) = self.signals.get(key) {
            return signal.clone();
        }
        let signal = CancelSignal::new();
        self.signals.insert(key.clone(), signal.clone());
        signal
    }

    pub(super) fn remove_signal(&mut self, key: &ScopeKey) -> bool {
        self.signals.remove(key).is_some()
    }

    /// Returns `false` when the handle was already tracked under `key`.
    pub(super) fn insert_process(&mut self, key: &ScopeKey, process: SharedProcess) -> bool {
        self.processes
            .entry(key.clone())
            .or_default()
            .insert(TrackedProcess(process))
    }

    /// Returns `true` when the handle was tracked under `key`.
    pub(super) fn remove_process(&mut self, key: &ScopeKey, process: &SharedProcess) -> bool {
        let Some(set) = self.processes.get_mut(key) else {
            return false;
        };
        let removed = set.remove(&TrackedProcess(Arc::clone(process)));
        if set.is_empty() {
            self.processes.remove(key);
        }
        removed
    }

    /// Copy of the handles tracked under `key`.
    pub(super) fn snapshot(&self, key: &ScopeKey) -> Vec<SharedProcess> {
        self.processes
            .get(key)
            .map(|set| set.iter().map(|tracked| Arc::clone(&tracked.0)).collect())
            .unwrap_or_default()
    }

    pub(super) fn process_count(&self, key: &ScopeKey) -> usize {
        self.processes.get(key).map_or(0, HashSet::len)
    }

    pub(super) fn has_process_entry(&self, key: &ScopeKey) -> bool {
        self.processes.contains_key(key)
    }

    pub(super) fn signal_count(&self) -> usize {
        self.signals.len()
    }
}
