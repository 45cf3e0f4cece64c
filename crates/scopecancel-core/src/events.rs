//! Cancellation lifecycle events.
//!
//! These events are emitted by the registry while it cancels a scope and can
//! be forwarded verbatim to UI clients (SSE, websocket). They are purely
//! observational: nothing in the termination protocol reads them back.

use crate::key::ScopeKey;
use serde::{Deserialize, Serialize};

/// Result of running the termination protocol against one process handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// Exit status was already observable; nothing was sent.
    AlreadyExited,
    /// The process disappeared before the graceful request landed.
    Vanished,
    /// An unexpected failure aborted the protocol for this handle.
    Failed,
    /// Exited within the grace budget after the graceful request.
    Terminated,
    /// Exited after the forceful request.
    Killed,
    /// Forceful request issued, exit not confirmed within its budget.
    KillUnconfirmed,
}

impl TerminationOutcome {
    /// Whether this outcome counts towards the `cancel` result.
    ///
    /// A handle counts once a termination request was issued, whether or not
    /// its exit was confirmed.
    pub const fn counts_as_stopped(self) -> bool {
        matches!(self, Self::Terminated | Self::Killed | Self::KillUnconfirmed)
    }
}

/// Cancellation lifecycle event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CancelEvent {
    /// The scope's signal was set; process teardown follows.
    Signalled { key: ScopeKey },

    /// One tracked process finished the termination protocol.
    Process {
        key: ScopeKey,
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
        outcome: TerminationOutcome,
    },

    /// The `cancel` call completed.
    Cancelled { key: ScopeKey, stopped: usize },
}

impl CancelEvent {
    pub fn signalled(key: &ScopeKey) -> Self {
        Self::Signalled { key: key.clone() }
    }

    pub fn process(key: &ScopeKey, pid: Option<u32>, outcome: TerminationOutcome) -> Self {
        Self::Process {
            key: key.clone(),
            pid,
            outcome,
        }
    }

    pub fn cancelled(key: &ScopeKey, stopped: usize) -> Self {
        Self::Cancelled {
            key: key.clone(),
            stopped,
        }
    }

    /// The scope this event belongs to.
    pub fn key(&self) -> &ScopeKey {
        match self {
            Self::Signalled { key } | Self::Process { key, .. } | Self::Cancelled { key, .. } => {
                key
            }
        }
    }
}
