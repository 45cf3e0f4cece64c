//! One-shot cancellation latch bound to a scope key.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Monotonic cancellation latch.
///
/// Starts unset; [`set`](Self::set) is idempotent and there is no way back.
/// Clones share the same latch, and [`same_as`](Self::same_as) tells whether
/// two values are the same instance rather than merely in the same state.
///
/// This is a cooperative contract: setting the signal never interrupts the
/// task holding it. Long-running work must check [`is_set`](Self::is_set) at
/// safe points, or race [`cancelled`](Self::cancelled) in a `select!`.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: Arc<CancellationToken>,
}

impl CancelSignal {
    /// Create a new, unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the signal.
    pub fn set(&self) {
        self.token.cancel();
    }

    /// Whether the signal has been latched.
    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is set (immediately if it already is).
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// A token that is cancelled together with this signal.
    ///
    /// Useful for handing cancellation to code that already speaks
    /// `tokio_util` tokens. Cancelling the returned token does not set the
    /// signal.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Whether `self` and `other` are the same latch instance.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.token, &other.token)
    }
}
