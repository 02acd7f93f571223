use std::fmt;

use lazy_static::lazy_static;

use crate::datum::KeyValue;
use crate::metadata::{MetaKey, MetaMap};

/// Identifies a span within one collector lifecycle.
///
/// Ids are dense and allocated by the collector from a monotonic counter;
/// [`SpanId::NONE`] is the reserved "no span" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(i64);

impl SpanId {
    /// The "no span" sentinel.
    pub const NONE: SpanId = SpanId(i64::MIN);

    /// Builds a span id from its raw value.
    pub const fn from_i64(id: i64) -> Self {
        SpanId(id)
    }

    /// The raw id value.
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Whether this is the "no span" sentinel.
    pub fn is_none(self) -> bool {
        self == SpanId::NONE
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("SpanId(none)")
        } else {
            f.debug_tuple("SpanId").field(&self.0).finish()
        }
    }
}

/// How a manual span relates to threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    /// The span begins and ends on the same thread.
    Sync,
    /// The span may migrate between threads before it ends.
    Async,
}

/// An owned handle for a manual span.
///
/// The handle *is* the span's state: its metadata carries the async
/// correlation id and the `(name, flavor)` record installed at entry, so
/// the collector needs no lock or lookup to close it. The handle must be
/// moved through the program (including across await points) and handed
/// back to exactly one [`Collector::exit_manual_span`] call.
#[derive(Debug)]
pub struct ExplicitSpan {
    /// The span's correlation id.
    pub span: SpanId,
    /// Context attached at entry, read back at exit.
    pub meta: MetaMap,
}

impl ExplicitSpan {
    /// A handle that no collector produced; exiting it is a no-op.
    pub fn none() -> Self {
        ExplicitSpan {
            span: SpanId::NONE,
            meta: MetaMap::new(),
        }
    }
}

lazy_static! {
    static ref ASYNC_ID: MetaKey<SpanId> = MetaKey::new();
    static ref ASYNC_DATA: MetaKey<(String, Option<Flavor>)> = MetaKey::new();
}

/// The well-known key under which a manual span's correlation id is
/// stored in its [`ExplicitSpan::meta`].
pub fn async_id_key() -> MetaKey<SpanId> {
    *ASYNC_ID
}

/// The well-known key under which a manual span's `(name, flavor)` record
/// is stored in its [`ExplicitSpan::meta`].
pub fn async_data_key() -> MetaKey<(String, Option<Flavor>)> {
    *ASYNC_DATA
}

/// The capability set of an installed collector backend.
///
/// Every operation is thread-safe and returns after at most a bounded
/// enqueue; nothing here blocks on I/O except [`Collector::shutdown`].
/// Implementations sample their own timestamps inside each operation.
pub trait Collector: Send + Sync + fmt::Debug {
    /// Opens a scope span. The caller must pass the returned id to
    /// [`Collector::exit_span`] on every exit path; the facade's
    /// [`with_span`](crate::trace::with_span) does this with a drop guard.
    fn enter_span(
        &self,
        fun: Option<&'static str>,
        file: &'static str,
        line: u32,
        attrs: Vec<KeyValue>,
        name: &str,
    ) -> SpanId;

    /// Closes a scope span previously opened by [`Collector::enter_span`].
    fn exit_span(&self, span: SpanId);

    /// Opens a manual span not tied to a lexical scope.
    ///
    /// With a `parent`, the new span inherits the parent's correlation id;
    /// otherwise a fresh id is allocated. `Flavor::Sync` promises that the
    /// span begins and ends on the same thread.
    #[allow(clippy::too_many_arguments)]
    fn enter_manual_span(
        &self,
        parent: Option<&ExplicitSpan>,
        flavor: Option<Flavor>,
        fun: Option<&'static str>,
        file: &'static str,
        line: u32,
        attrs: Vec<KeyValue>,
        name: &str,
    ) -> ExplicitSpan;

    /// Closes a manual span. Passing a span produced by a different
    /// collector is undefined.
    fn exit_manual_span(&self, span: ExplicitSpan);

    /// Emits an instant event. `span`, if present, is informational only.
    fn message(&self, span: Option<SpanId>, attrs: Vec<KeyValue>, msg: &str);

    /// Emits an integer counter sample.
    fn counter_int(&self, name: &str, value: i64);

    /// Emits a float counter sample.
    fn counter_float(&self, name: &str, value: f64);

    /// Attaches a display name to the calling thread.
    fn name_thread(&self, name: &str);

    /// Attaches a display name to the process.
    fn name_process(&self, name: &str);

    /// Blocks until all previously enqueued events are persisted and the
    /// output is closed. Idempotent.
    fn shutdown(&self);
}
