//! Messages sent from emitting threads to the writer thread.

use tracekit::{Flavor, KeyValue, SpanId};

/// A counter sample's value, preserving its integer or float nature for
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CounterValue {
    Int(i64),
    Float(f64),
}

/// One emission, constructed on the emitting thread and owned by the
/// queue until the writer thread consumes it.
#[derive(Debug)]
pub(crate) enum Event {
    /// Periodic flush marker from the ticker thread.
    Tick,
    /// An instant event.
    Message {
        tid: u64,
        ts: f64,
        msg: String,
        attrs: Vec<KeyValue>,
    },
    /// A scope span opened; recorded in the writer's registry, nothing
    /// emitted yet.
    DefineSpan {
        span: SpanId,
        tid: u64,
        ts: f64,
        name: String,
        fun: Option<&'static str>,
        attrs: Vec<KeyValue>,
    },
    /// A scope span closed; pairs with the registry entry to form one
    /// complete duration event.
    ExitSpan { span: SpanId, ts: f64 },
    /// A manual span entered.
    EnterManualSpan {
        span: SpanId,
        tid: u64,
        ts: f64,
        name: String,
        flavor: Option<Flavor>,
        fun: Option<&'static str>,
        attrs: Vec<KeyValue>,
    },
    /// A manual span exited; name and flavor were read back from the
    /// explicit span's metadata.
    ExitManualSpan {
        span: SpanId,
        tid: u64,
        ts: f64,
        name: String,
        flavor: Option<Flavor>,
    },
    /// A counter sample.
    Counter {
        tid: u64,
        ts: f64,
        name: String,
        value: CounterValue,
    },
    /// Display name for a thread.
    ThreadName { tid: u64, name: String },
    /// Display name for the process.
    ProcessName { name: String },
}
