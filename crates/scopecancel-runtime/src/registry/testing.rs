//! Scripted `ProcessHandle` for registry tests.
//!
//! Exit times are computed from deadlines instead of spawned timers, so the
//! fakes behave deterministically under `tokio::time::pause`.

use async_trait::async_trait;
use scopecancel_core::{CancelSignal, ProcessHandle, SharedProcess, TerminationError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Exits this long after the first graceful request.
    ExitOnTerminate(Duration),
    /// Ignores SIGTERM, exits as soon as it is killed.
    ExitOnKill,
    /// Never observed to exit.
    IgnoreAll,
    /// Exit status already available at registration time.
    AlreadyExited,
    /// Graceful request finds no such process.
    Gone,
    /// Graceful request fails with a non-lookup error.
    TerminateFails,
    /// Waiting for exit fails.
    WaitFails,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeState {
    pub terminate_calls: usize,
    pub kill_calls: usize,
    pub terminated_at: Option<Instant>,
    pub killed_at: Option<Instant>,
    pub exited_at: Option<Instant>,
    /// Whether the observed signal was set when the graceful request arrived.
    pub signal_set_at_terminate: Option<bool>,
    deadline: Option<Instant>,
}

#[derive(Debug)]
pub(crate) struct FakeProcess {
    pid: u32,
    behavior: Behavior,
    observed: Mutex<Option<CancelSignal>>,
    state: Mutex<FakeState>,
}

impl FakeProcess {
    pub(crate) fn new(pid: u32, behavior: Behavior) -> Arc<Self> {
        let state = FakeState {
            exited_at: matches!(behavior, Behavior::AlreadyExited).then(Instant::now),
            ..FakeState::default()
        };
        Arc::new(Self {
            pid,
            behavior,
            observed: Mutex::new(None),
            state: Mutex::new(state),
        })
    }

    pub(crate) fn shared(self: &Arc<Self>) -> SharedProcess {
        Arc::clone(self) as SharedProcess
    }

    /// Record whether `signal` is already set when `terminate` is called.
    pub(crate) fn observe(&self, signal: CancelSignal) {
        *self.observed.lock().unwrap() = Some(signal);
    }

    pub(crate) fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }

    fn exit_by(&self, at: Instant) {
        let mut state = self.state.lock().unwrap();
        state.deadline.get_or_insert(at);
    }
}

#[async_trait]
impl ProcessHandle for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn has_exited(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.exited_at.is_some() {
            return true;
        }
        match state.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                state.exited_at = Some(deadline);
                true
            }
            _ => false,
        }
    }

    fn terminate(&self) -> Result<(), TerminationError> {
        let seen = self.observed.lock().unwrap().as_ref().map(CancelSignal::is_set);
        {
            let mut state = self.state.lock().unwrap();
            state.terminate_calls += 1;
            state.terminated_at.get_or_insert_with(Instant::now);
            if seen.is_some() {
                state.signal_set_at_terminate = seen;
            }
        }
        match self.behavior {
            Behavior::Gone => Err(TerminationError::ProcessGone),
            Behavior::TerminateFails => Err(TerminationError::Signal("EPERM".to_string())),
            Behavior::ExitOnTerminate(after) => {
                self.exit_by(Instant::now() + after);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn kill(&self) -> Result<(), TerminationError> {
        {
            let mut state = self.state.lock().unwrap();
            state.kill_calls += 1;
            state.killed_at.get_or_insert_with(Instant::now);
        }
        match self.behavior {
            Behavior::ExitOnKill => {
                self.exit_by(Instant::now());
                Ok(())
            }
            Behavior::IgnoreAll => Err(TerminationError::Signal("EPERM".to_string())),
            _ => Ok(()),
        }
    }

    async fn wait_for_exit(&self, budget: Duration) -> Result<bool, TerminationError> {
        if matches!(self.behavior, Behavior::WaitFails) {
            return Err(TerminationError::Io(std::io::Error::other("wait failed")));
        }
        let deadline = {
            let state = self.state.lock().unwrap();
            if state.exited_at.is_some() {
                return Ok(true);
            }
            state.deadline
        };
        match deadline {
            Some(deadline) if deadline <= Instant::now() + budget => {
                sleep_until(deadline).await;
                let mut state = self.state.lock().unwrap();
                state.exited_at.get_or_insert(deadline);
                Ok(true)
            }
            _ => {
                sleep(budget).await;
                Ok(false)
            }
        }
    }
}
