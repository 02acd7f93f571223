//! A lightweight tracing facade with pluggable collectors.
//!
//! Instrumented code declares spans, messages, and counters through the
//! free functions in [`trace`] (or the [`with_span!`] macro); a collector
//! installed through [`global`] receives every emission and persists it.
//! When no collector is installed, all instrumentation is a cheap no-op.
//!
//! # Getting Started
//!
//! ```no_run
//! use tracekit::trace;
//!
//! fn handle_request() {
//!     trace::with_span("handle_request", Vec::new(), |_span| {
//!         // traced work here...
//!     });
//! }
//! ```
//!
//! Backends implement the [`Collector`] trait and are installed with
//! [`global::install`]. Spans that outlive a lexical scope (for example
//! spans spanning an async request) are modelled as [`ExplicitSpan`]
//! values: owned handles that carry their own correlation metadata in a
//! [`MetaMap`], so collectors never need a side table to close them.
//!
//! # Crate Feature Flags
//!
//! * `internal-logs`: forward this crate's self-diagnostics to the
//!   [`tracing`](https://crates.io/crates/tracing) ecosystem (enabled by
//!   default).

mod collector;
mod datum;
pub mod global;
mod internal_logging;
pub mod metadata;
pub mod time;
pub mod trace;

pub use collector::{async_data_key, async_id_key, Collector, ExplicitSpan, Flavor, SpanId};
pub use datum::{Datum, KeyValue};
pub use metadata::{MetaKey, MetaMap, MissingKeyError};
