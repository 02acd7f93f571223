//! Instrumentation entry points.
//!
//! Thin forwarders over the globally installed [`Collector`]; every
//! function here is a cheap no-op while no collector is installed, so
//! libraries can instrument unconditionally.

use std::sync::Arc;

use crate::collector::{Collector, ExplicitSpan, Flavor, SpanId};
use crate::datum::KeyValue;
use crate::global;

/// Runs `body` inside a scope span.
///
/// The span is opened before the body runs and closed on every exit path,
/// including unwinding; a panic raised by the body propagates unchanged
/// after the closing event is emitted. Returns the body's result.
///
/// ```no_run
/// let total = tracekit::trace::with_span("sum", Vec::new(), |_span| {
///     (1..=10).sum::<i32>()
/// });
/// ```
pub fn with_span<F, R>(name: &str, attrs: Vec<KeyValue>, body: F) -> R
where
    F: FnOnce(SpanId) -> R,
{
    with_span_at(None, "", 0, attrs, name, body)
}

/// [`with_span`] with an explicit source location and enclosing function
/// name. The [`with_span!`](crate::with_span!) macro fills the location
/// in automatically.
pub fn with_span_at<F, R>(
    fun: Option<&'static str>,
    file: &'static str,
    line: u32,
    attrs: Vec<KeyValue>,
    name: &str,
    body: F,
) -> R
where
    F: FnOnce(SpanId) -> R,
{
    match global::current() {
        Some(collector) => {
            let span = collector.enter_span(fun, file, line, attrs, name);
            let _guard = SpanGuard { collector, span };
            body(span)
        }
        None => body(SpanId::NONE),
    }
}

/// Closes the span when dropped, so the exit event is emitted on normal
/// returns and during unwinding alike.
struct SpanGuard {
    collector: Arc<dyn Collector>,
    span: SpanId,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.collector.exit_span(self.span);
    }
}

/// Opens a manual span; see [`Collector::enter_manual_span`].
///
/// The returned handle must be passed to [`exit_manual_span`] exactly
/// once. Dropping it silently loses the span's end event.
#[allow(clippy::too_many_arguments)]
pub fn enter_manual_span(
    parent: Option<&ExplicitSpan>,
    flavor: Option<Flavor>,
    fun: Option<&'static str>,
    file: &'static str,
    line: u32,
    attrs: Vec<KeyValue>,
    name: &str,
) -> ExplicitSpan {
    match global::current() {
        Some(collector) => {
            collector.enter_manual_span(parent, flavor, fun, file, line, attrs, name)
        }
        None => ExplicitSpan::none(),
    }
}

/// Closes a manual span opened by [`enter_manual_span`].
pub fn exit_manual_span(span: ExplicitSpan) {
    if let Some(collector) = global::current() {
        collector.exit_manual_span(span);
    }
}

/// Emits an instant event.
pub fn message(span: Option<SpanId>, attrs: Vec<KeyValue>, msg: &str) {
    if let Some(collector) = global::current() {
        collector.message(span, attrs, msg);
    }
}

/// Emits an integer counter sample.
pub fn counter_int(name: &str, value: i64) {
    if let Some(collector) = global::current() {
        collector.counter_int(name, value);
    }
}

/// Emits a float counter sample.
pub fn counter_float(name: &str, value: f64) {
    if let Some(collector) = global::current() {
        collector.counter_float(name, value);
    }
}

/// Attaches a display name to the calling thread.
pub fn name_thread(name: &str) {
    if let Some(collector) = global::current() {
        collector.name_thread(name);
    }
}

/// Attaches a display name to the process.
pub fn name_process(name: &str) {
    if let Some(collector) = global::current() {
        collector.name_process(name);
    }
}

/// Runs a block inside a scope span, capturing the call site's file and
/// line.
///
/// ```no_run
/// use tracekit::with_span;
///
/// let n = with_span!("parse", |_span| { 42 });
/// let m = with_span!("encode", [("len", 3i64)], |_span| { 7 });
/// # let _ = (n, m);
/// ```
#[macro_export]
macro_rules! with_span {
    ($name:expr, $body:expr) => {
        $crate::trace::with_span_at(None, file!(), line!(), Vec::new(), $name, $body)
    };
    ($name:expr, [$(($key:expr, $value:expr)),* $(,)?], $body:expr) => {
        $crate::trace::with_span_at(
            None,
            file!(),
            line!(),
            vec![$($crate::KeyValue::new($key, $value)),*],
            $name,
            $body,
        )
    };
}
