//! A blocking multi-producer/single-consumer FIFO with close semantics.
//!
//! Producers are the instrumented threads; the single consumer is the
//! writer thread. [`BlockingQueue::transfer`] moves the whole queue into
//! the consumer's own sink in one critical section, so the per-event
//! cost on the consumer amortizes to a fraction of a lock acquisition.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};

use thiserror::Error;

/// The error returned once [`BlockingQueue::close`] has been called and
/// no elements remain.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("queue closed")]
pub struct Closed;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A blocking MPSC FIFO.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        BlockingQueue::new()
    }
}

impl<T> BlockingQueue<T> {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        BlockingQueue {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues `item`, waking the consumer if the queue was empty.
    ///
    /// Fails once the queue is closed; during an orderly shutdown race
    /// producers are expected to swallow that failure.
    pub fn push(&self, item: T) -> Result<(), Closed> {
        let mut state = self.state.lock().expect("queue lock poisoned");
        if state.closed {
            return Err(Closed);
        }
        let was_empty = state.items.is_empty();
        state.items.push_back(item);
        if was_empty {
            self.available.notify_one();
        }
        Ok(())
    }

    /// Dequeues the next element, blocking while the queue is empty and
    /// open. Fails only when the queue is empty *and* closed; elements
    /// enqueued before the close are still delivered in order.
    pub fn pop(&self) -> Result<T, Closed> {
        let mut state = self.state.lock().expect("queue lock poisoned");
        loop {
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            if state.closed {
                return Err(Closed);
            }
            state = self.available.wait(state).expect("queue lock poisoned");
        }
    }

    /// Moves the queue's entire contents into `sink` in FIFO order,
    /// blocking while the queue is empty and open. Fails only when the
    /// queue is empty and closed.
    pub fn transfer(&self, sink: &mut VecDeque<T>) -> Result<(), Closed> {
        let mut state = self.state.lock().expect("queue lock poisoned");
        loop {
            if !state.items.is_empty() {
                sink.append(&mut state.items);
                return Ok(());
            }
            if state.closed {
                return Err(Closed);
            }
            state = self.available.wait(state).expect("queue lock poisoned");
        }
    }

    /// Marks the queue closed and wakes all waiters. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().expect("queue lock poisoned");
        f.debug_struct("BlockingQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
