//! A [`tracekit`] collector backend that writes Catapult / Chrome Trace
//! Event JSON.
//!
//! The produced document is a single JSON array of event objects, ready
//! for `chrome://tracing` or [Perfetto]. Emitting threads hand events to
//! a dedicated writer thread over a blocking queue; a ticker thread
//! flushes the output every 500 ms.
//!
//! # Getting Started
//!
//! ```no_run
//! use tracekit::{global, trace};
//! use tracekit_catapult::CatapultCollector;
//!
//! fn main() -> std::io::Result<()> {
//!     CatapultCollector::builder().with_file("trace.json").install()?;
//!
//!     trace::with_span("main", Vec::new(), |_span| {
//!         trace::counter_int("jobs", 1);
//!     });
//!
//!     global::shutdown();
//!     Ok(())
//! }
//! ```
//!
//! Alternatively, [`install_from_env`] configures the output from the
//! `TRACE` environment variable.
//!
//! [Perfetto]: https://ui.perfetto.dev

mod collector;
mod event;
pub mod queue;
mod writer;

use std::env;
use std::io;
use std::sync::Arc;

pub use collector::{CatapultCollector, CatapultCollectorBuilder};

/// The environment variable read by [`install_from_env`].
pub const TRACE_ENV: &str = "TRACE";

const DEFAULT_TRACE_FILE: &str = "trace.json";

/// Installs a collector according to the `TRACE` environment variable.
///
/// * unset or empty: nothing is installed, `Ok(None)`;
/// * `1`: write to `trace.json` in the working directory;
/// * `stdout` / `stderr`: write to the corresponding standard stream;
/// * anything else: treated as a file path.
pub fn install_from_env() -> io::Result<Option<Arc<CatapultCollector>>> {
    let value = match env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    let builder = match value.as_str() {
        "" => return Ok(None),
        "1" => CatapultCollector::builder().with_file(DEFAULT_TRACE_FILE),
        "stdout" => CatapultCollector::builder().with_stdout(),
        "stderr" => CatapultCollector::builder().with_stderr(),
        path => CatapultCollector::builder().with_file(path),
    };
    builder.install().map(Some)
}
