//! Blocking FIFO with completion tracking, shared by the task and result stages.
//!
//! `put` appends, `take` blocks for the head and marks it in flight, `mark_done` retires an
//! in-flight item and `join` blocks until nothing is queued or in flight. The pipeline never
//! polls: every wait is on a condition variable guarded by the same mutex as the state.

use log::warn;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState<T> {
    items: VecDeque<T>,
    in_flight: usize,
    closed: bool,
}

pub struct WorkQueue<T> {
    name: &'static str,
    state: Mutex<QueueState<T>>,
    /// Signalled when an item is appended or the queue is closed.
    available: Condvar,
    /// Signalled when the queue becomes drained.
    drained: Condvar,
}

impl<T> WorkQueue<T> {
    /// `name` labels log lines ("tasks", "results").
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                in_flight: 0,
                closed: false,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    // Every critical section leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to the tail and wake one blocked taker.
    pub fn put(&self, item: T) {
        let mut state = self.lock();
        if state.closed {
            warn!("{} queue: put after close, item dropped", self.name);
            return;
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
    }

    /// Block until an item is available, remove and return it, and count it as in flight.
    /// Returns `None` once the queue is closed and empty; that is the exit signal for consumers.
    pub fn take(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                state.in_flight += 1;
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Retire one item previously returned by [`take`](Self::take).
    pub fn mark_done(&self) {
        let mut state = self.lock();
        match state.in_flight.checked_sub(1) {
            Some(n) => state.in_flight = n,
            None => {
                warn!("{} queue: mark_done without a matching take", self.name);
                return;
            }
        }
        if state.in_flight == 0 && state.items.is_empty() {
            self.drained.notify_all();
        }
    }

    /// Block until the queue is empty and every taken item has been marked done.
    pub fn join(&self) {
        let mut state = self.lock();
        while !(state.items.is_empty() && state.in_flight == 0) {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stop accepting items and wake every blocked taker. Items already queued are still handed out.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Queued (not yet taken) items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items taken but not yet marked done.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.items.is_empty() && state.in_flight == 0
    }
}

/// Calls [`WorkQueue::mark_done`] when dropped, so the item is retired even if the
/// work in between unwinds.
pub struct DoneGuard<'a, T> {
    queue: &'a WorkQueue<T>,
}

impl<'a, T> DoneGuard<'a, T> {
    pub fn new(queue: &'a WorkQueue<T>) -> Self {
        Self { queue }
    }
}

impl<T> Drop for DoneGuard<'_, T> {
    fn drop(&mut self) {
        self.queue.mark_done();
    }
}
