use super::CancellationRegistry;
use scopecancel_core::{ScopeKey, SharedProcess};
use std::sync::Arc;

/// Scope guard that unregisters a tracked process on drop.
///
/// This ensures the process table entry is always cleaned up, even on error
/// paths where the executor returns before reaching its own unregister call.
#[derive(Debug)]
pub struct ProcessRegistration {
    registry: Arc<CancellationRegistry>,
    key: ScopeKey,
    process: SharedProcess,
}

impl ProcessRegistration {
    pub(super) const fn new(
        registry: Arc<CancellationRegistry>,
        key: ScopeKey,
        process: SharedProcess,
    ) -> Self {
        Self {
            registry,
            key,
            process,
        }
    }

    pub const fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub const fn process(&self) -> &SharedProcess {
        &self.process
    }
}

impl Drop for ProcessRegistration {
    fn drop(&mut self) {
        self.registry.unregister_process(&self.key, &self.process);
    }
}
