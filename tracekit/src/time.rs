//! Monotonic microsecond time, process/thread identity, and mock mode.
//!
//! All timestamp sampling in this crate and its backends goes through
//! [`now_micros`], so the clock can be swapped for a deterministic one in
//! snapshot tests. Mock mode is process-wide and one-way: once enabled,
//! the clock becomes an integer counter starting at 0 that advances by 1
//! per observation, [`pid`] is pinned to 2, and [`tid`] to 3.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use lazy_static::lazy_static;

lazy_static! {
    static ref EPOCH: Instant = Instant::now();
}

static MOCK: AtomicBool = AtomicBool::new(false);
static MOCK_NOW: AtomicU64 = AtomicU64::new(0);
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Switch the process into deterministic mock mode.
///
/// Intended for snapshot tests; there is deliberately no way back.
pub fn enable_mock() {
    MOCK.store(true, Ordering::SeqCst);
}

fn mocked() -> bool {
    MOCK.load(Ordering::Relaxed)
}

/// Microseconds on a monotonic clock.
///
/// The real clock counts from the first observation in this process; the
/// mock clock yields 0, 1, 2, … per call.
pub fn now_micros() -> f64 {
    if mocked() {
        MOCK_NOW.fetch_add(1, Ordering::Relaxed) as f64
    } else {
        EPOCH.elapsed().as_nanos() as f64 / 1_000.0
    }
}

/// The current process id (2 under mock mode).
pub fn pid() -> u64 {
    if mocked() {
        2
    } else {
        std::process::id() as u64
    }
}

/// A dense id for the calling OS thread (3 under mock mode).
///
/// Ids are assigned on first observation per thread and never reused.
pub fn tid() -> u64 {
    if mocked() {
        3
    } else {
        THREAD_ID.with(|id| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_ids_are_distinct_per_thread() {
        let here = tid();
        assert_eq!(here, tid());

        let there = std::thread::spawn(tid).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn real_clock_is_monotonic() {
        let a = now_micros();
        let b = now_micros();
        assert!(b >= a);
    }
}
