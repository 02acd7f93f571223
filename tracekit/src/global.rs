//! The process-wide collector slot.
//!
//! At most one collector is active at a time. Installation replaces any
//! prior collector; emission sites clone the slot's `Arc` and may finish
//! an emission that raced with [`shutdown`], as the collector's own
//! shutdown guarantees those events are not lost.

use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

use crate::collector::Collector;
use crate::tk_debug;

lazy_static! {
    static ref ACTIVE_COLLECTOR: RwLock<Option<Arc<dyn Collector>>> = RwLock::new(None);
}

/// Installs `collector` as the process-wide collector, returning the one
/// it replaced, if any.
///
/// The replaced collector is *not* shut down; callers that want its
/// output finalized should call [`Collector::shutdown`] on it.
pub fn install(collector: Arc<dyn Collector>) -> Option<Arc<dyn Collector>> {
    tk_debug!(name: "global.install");
    ACTIVE_COLLECTOR
        .write()
        .expect("ACTIVE_COLLECTOR RwLock poisoned")
        .replace(collector)
}

/// The currently installed collector, if any.
pub fn current() -> Option<Arc<dyn Collector>> {
    ACTIVE_COLLECTOR
        .read()
        .expect("ACTIVE_COLLECTOR RwLock poisoned")
        .clone()
}

/// Clears the slot and shuts the active collector down, blocking until
/// its output is closed. A no-op when nothing is installed.
pub fn shutdown() {
    let prior = ACTIVE_COLLECTOR
        .write()
        .expect("ACTIVE_COLLECTOR RwLock poisoned")
        .take();
    if let Some(collector) = prior {
        tk_debug!(name: "global.shutdown");
        collector.shutdown();
    }
}
