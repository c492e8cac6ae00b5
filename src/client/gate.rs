//! Single-flight coordination for token refresh.
//!
//! The first request to observe a 401 while the gate is idle becomes the leader
//! and performs the refresh; every request that arrives while the refresh is in
//! progress is queued as a waiter and resumed with the cycle's outcome.
//!
//! Entering the gate (check `in_progress`, then either claim it or enqueue) and
//! completing it (reset `in_progress`, take the waiter list) each happen inside
//! one critical section, so no request can slip in between the drain and the
//! reset and be left without a wakeup.

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Result of one refresh cycle, broadcast to every waiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token; already written to the credential store
    Refreshed(String),
    /// Refresh impossible; the credential store has been cleared
    Failed,
    /// Leader went away before finishing; waiters should retry from scratch
    Abandoned,
}

/// Callback invoked once with the outcome of the cycle it was queued on
pub type Waiter = Box<dyn FnOnce(RefreshOutcome) + Send>;

#[derive(Default)]
struct GateState {
    in_progress: bool,
    waiters: Vec<Waiter>,
    cycles: u64,
}

/// Refresh gate: `Idle` <-> `Refreshing`
#[derive(Default)]
pub struct RefreshGate {
    state: Mutex<GateState>,
}

/// How a caller got through the gate
pub enum Entry<'a> {
    /// Caller owns the refresh cycle and must complete the lease
    Leader(RefreshLease<'a>),
    /// Caller was queued behind an in-flight refresh
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate if idle, otherwise queue behind the current refresh
    pub fn enter(&self) -> Entry<'_> {
        let mut state = self.state.lock();
        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(Box::new(move |outcome| {
                // Receiver dropped means the caller gave up; nothing to resume
                let _ = tx.send(outcome);
            }));
            Entry::Waiter(rx)
        } else {
            state.in_progress = true;
            state.cycles += 1;
            Entry::Leader(RefreshLease {
                gate: self,
                completed: false,
            })
        }
    }

    /// Claim the gate only if no refresh is running
    pub fn try_begin(&self) -> Option<RefreshLease<'_>> {
        let mut state = self.state.lock();
        if state.in_progress {
            return None;
        }
        state.in_progress = true;
        state.cycles += 1;
        Some(RefreshLease {
            gate: self,
            completed: false,
        })
    }

    /// Queue a callback on the in-flight refresh.
    ///
    /// Hands the callback back when the gate is idle, since there is no cycle
    /// that would ever invoke it.
    pub fn subscribe(&self, waiter: Waiter) -> Result<(), Waiter> {
        let mut state = self.state.lock();
        if !state.in_progress {
            return Err(waiter);
        }
        state.waiters.push(waiter);
        Ok(())
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().in_progress
    }

    /// Number of callers currently queued
    pub fn pending(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Refresh cycles started over the gate's lifetime
    pub fn cycles(&self) -> u64 {
        self.state.lock().cycles
    }

    fn finish(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.state.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };

        let count = waiters.len();
        // FIFO, outside the lock so a waiter may re-enter the gate
        for waiter in waiters {
            waiter(outcome.clone());
        }
        count
    }
}

/// Ownership of one refresh cycle.
///
/// Dropping an uncompleted lease resolves the cycle as [`RefreshOutcome::Abandoned`].
pub struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    completed: bool,
}

impl RefreshLease<'_> {
    /// Reset the gate and wake every waiter; returns how many were woken
    pub fn complete(mut self, outcome: RefreshOutcome) -> usize {
        self.completed = true;
        self.gate.finish(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("Refresh leader dropped before completion, releasing waiters");
            self.gate.finish(RefreshOutcome::Abandoned);
        }
    }
}
