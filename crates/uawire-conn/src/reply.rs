use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uawire_edf::EdfData;

/// Single-slot rendezvous between the decode loop and a waiting requester.
///
/// `deposit` does not succeed until a `collect` takes the tree: a reply
/// nobody is waiting for stays in the slot only until the depositor's
/// timeout, then is dropped. The decode loop is the only depositor.
/// Closing the slot wakes both sides; a closed slot refuses traffic.
pub struct ReplySlot {
    state: Mutex<SlotState>,
    cond: Condvar,
}

struct SlotState {
    tree: Option<EdfData>,
    closed: bool,
}

impl ReplySlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                tree: None,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Offer a reply to a waiting collector.
    ///
    /// Returns `true` when a collector took the tree within `timeout`,
    /// `false` when the hand-off timed out or the slot is closed. On
    /// failure the tree is dropped.
    pub fn deposit(&self, tree: EdfData, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        if state.closed {
            return false;
        }

        state.tree = Some(tree);
        self.cond.notify_all();

        while state.tree.is_some() && !state.closed {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            state = self.wait(state, remaining);
        }

        state.tree.take().is_none()
    }

    /// Wait up to `timeout` for a deposited reply.
    ///
    /// Returns `None` on timeout or when the slot is closed; callers that
    /// need to tell those apart check [`is_closed`](Self::is_closed).
    pub fn collect(&self, timeout: Duration) -> Option<EdfData> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(tree) = state.tree.take() {
                self.cond.notify_all();
                return Some(tree);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            state = self.wait(state, remaining);
        }
    }

    /// Shut the slot down and wake all waiters.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        &self,
        guard: MutexGuard<'a, SlotState>,
        timeout: Duration,
    ) -> MutexGuard<'a, SlotState> {
        let (guard, _) = self
            .cond
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }
}

impl Default for ReplySlot {
    fn default() -> Self {
        Self::new()
    }
}
