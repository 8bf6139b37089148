use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::port::Pair;

/// Result of a blocking pop on the [`PairQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pop {
    /// A pair was claimed. The caller must report it back with
    /// [`PairQueue::complete`] or [`PairQueue::requeue`].
    Pair(Pair),
    /// Nothing arrived before the wait expired.
    Empty,
    /// The queue has been closed; no further pairs will be handed out.
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Pair>,
    /// Pairs popped but not yet completed.
    in_flight: usize,
    closed: bool,
}

/// The work queue of pending active pairs.
///
/// Besides the pairs themselves the queue counts how many popped pairs are still being
/// worked on. The count is raised under the same lock that hands the pair out, so
/// "empty and nothing in flight" is an exact observation rather than a snapshot race.
/// Every state change wakes all waiters, which is how workers and the coordinator
/// share one condition variable.
#[derive(Debug, Default)]
pub struct PairQueue {
    state: Mutex<QueueState>,
    changed: Condvar,
}

impl PairQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Returns `false` if the queue is closed.
    pub fn push(&self, pair: Pair) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            log::trace!("Dropping {pair}: queue closed");
            return false;
        }
        state.items.push_back(pair);
        drop(state);
        self.changed.notify_all();
        true
    }

    /// Blocks for at most `wait` until a pair is available or the queue is closed.
    pub fn pop(&self, wait: Duration) -> Pop {
        let deadline = Instant::now() + wait;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Pop::Closed;
            }
            if let Some(pair) = state.items.pop_front() {
                state.in_flight += 1;
                return Pop::Pair(pair);
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return if state.closed {
                    Pop::Closed
                } else {
                    match state.items.pop_front() {
                        Some(pair) => {
                            state.in_flight += 1;
                            Pop::Pair(pair)
                        }
                        None => Pop::Empty,
                    }
                };
            }
        }
    }

    /// Marks a popped pair as finished.
    pub fn complete(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.in_flight > 0, "complete() without a matching pop");
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.changed.notify_all();
    }

    /// Gives a popped pair back, at the front of the queue, without processing it.
    pub fn requeue(&self, pair: Pair) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.items.push_front(pair);
        drop(state);
        self.changed.notify_all();
    }

    /// Closes the queue. Pending pairs stay where they are but are no longer handed
    /// out, and pushes are refused.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of pairs waiting to be popped.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// True when nothing is queued and nothing is being worked on.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.items.is_empty() && state.in_flight == 0
    }

    /// Blocks for at most `wait` or until the queue changes, whichever comes first.
    /// Returns whether the queue was idle when the wait ended.
    pub fn wait_for_change(&self, wait: Duration) -> bool {
        let mut state = self.state.lock();
        if !(state.items.is_empty() && state.in_flight == 0) {
            self.changed.wait_for(&mut state, wait);
        }
        state.items.is_empty() && state.in_flight == 0
    }
}
