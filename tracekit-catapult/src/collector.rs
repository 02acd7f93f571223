//! The collector engine: span-id generator, event queue, writer thread,
//! ticker thread.
//!
//! Emitting threads only ever construct an [`Event`] and push it; all
//! I/O, the span registry, and the output document live on the writer
//! thread. A ticker thread pushes a flush marker every 500 ms so traces
//! stay fresh on disk even at low event rates.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracekit::{
    async_data_key, async_id_key, global, time, tk_error, tk_warn, Collector, ExplicitSpan,
    Flavor, KeyValue, MetaMap, SpanId,
};

use crate::event::{CounterValue, Event};
use crate::queue::BlockingQueue;
use crate::writer::JsonWriter;

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Where the trace document goes.
enum Output {
    Stdout,
    Stderr,
    File(PathBuf),
    Writer(Box<dyn Write + Send>),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("Stdout"),
            Output::Stderr => f.write_str("Stderr"),
            Output::File(path) => f.debug_tuple("File").field(path).finish(),
            Output::Writer(_) => f.write_str("Writer"),
        }
    }
}

/// Configures and builds a [`CatapultCollector`].
///
/// ```no_run
/// use tracekit_catapult::CatapultCollector;
///
/// let _collector = CatapultCollector::builder()
///     .with_file("trace.json")
///     .install()
///     .expect("failed to start trace writer");
/// ```
#[derive(Debug)]
pub struct CatapultCollectorBuilder {
    output: Output,
}

impl Default for CatapultCollectorBuilder {
    fn default() -> Self {
        CatapultCollectorBuilder {
            output: Output::Stdout,
        }
    }
}

impl CatapultCollectorBuilder {
    /// Write the trace document to standard output.
    pub fn with_stdout(mut self) -> Self {
        self.output = Output::Stdout;
        self
    }

    /// Write the trace document to standard error.
    pub fn with_stderr(mut self) -> Self {
        self.output = Output::Stderr;
        self
    }

    /// Write the trace document to a file, created or truncated when the
    /// collector starts and closed on shutdown.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Output::File(path.into());
        self
    }

    /// Write the trace document to an arbitrary sink.
    pub fn with_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Output::Writer(Box::new(writer));
        self
    }

    /// Opens the output and starts the writer and ticker threads.
    pub fn build(self) -> io::Result<CatapultCollector> {
        let sink: Box<dyn Write + Send> = match self.output {
            Output::Stdout => Box::new(io::stdout()),
            Output::Stderr => Box::new(io::stderr()),
            Output::File(path) => Box::new(BufWriter::new(File::create(path)?)),
            Output::Writer(writer) => writer,
        };

        let queue = Arc::new(BlockingQueue::new());

        let writer_queue = Arc::clone(&queue);
        let writer = thread::Builder::new()
            .name("tracekit-catapult-writer".to_string())
            .spawn(move || write_loop(&writer_queue, sink))?;

        let ticker_queue = Arc::clone(&queue);
        let ticker = thread::Builder::new()
            .name("tracekit-catapult-ticker".to_string())
            .spawn(move || loop {
                thread::sleep(TICK_INTERVAL);
                if ticker_queue.push(Event::Tick).is_err() {
                    break;
                }
            });
        if let Err(err) = ticker {
            // unblock and retire the writer thread before bailing out
            queue.close();
            let _ = writer.join();
            return Err(err);
        }

        Ok(CatapultCollector {
            next_span_id: AtomicI64::new(0),
            queue,
            active: AtomicBool::new(true),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Builds the collector and installs it as the process-wide
    /// collector.
    pub fn install(self) -> io::Result<Arc<CatapultCollector>> {
        let collector = Arc::new(self.build()?);
        global::install(collector.clone());
        Ok(collector)
    }
}

/// A [`Collector`] that writes a Catapult / Chrome Trace Event JSON
/// document.
///
/// Open the result in `chrome://tracing` or [Perfetto]. Emissions never
/// block beyond a short enqueue; [`Collector::shutdown`] drains the
/// queue, closes the JSON array, and joins the writer thread.
///
/// [Perfetto]: https://ui.perfetto.dev
pub struct CatapultCollector {
    next_span_id: AtomicI64,
    queue: Arc<BlockingQueue<Event>>,
    active: AtomicBool,
    writer: Mutex<Option<thread::JoinHandle<()>>>,
}

impl fmt::Debug for CatapultCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatapultCollector")
            .field("active", &self.active.load(Ordering::Relaxed))
            .field("queue", &self.queue)
            .finish()
    }
}

impl CatapultCollector {
    /// Starts configuring a collector.
    pub fn builder() -> CatapultCollectorBuilder {
        CatapultCollectorBuilder::default()
    }

    fn fresh_span_id(&self) -> SpanId {
        SpanId::from_i64(self.next_span_id.fetch_add(1, Ordering::Relaxed))
    }

    // A Closed failure here means shutdown already raced past us; the
    // event is intentionally dropped.
    fn push(&self, event: Event) {
        let _ = self.queue.push(event);
    }
}

impl Collector for CatapultCollector {
    fn enter_span(
        &self,
        fun: Option<&'static str>,
        _file: &'static str,
        _line: u32,
        attrs: Vec<KeyValue>,
        name: &str,
    ) -> SpanId {
        let span = self.fresh_span_id();
        self.push(Event::DefineSpan {
            span,
            tid: time::tid(),
            ts: time::now_micros(),
            name: name.to_owned(),
            fun,
            attrs,
        });
        span
    }

    fn exit_span(&self, span: SpanId) {
        self.push(Event::ExitSpan {
            span,
            ts: time::now_micros(),
        });
    }

    fn enter_manual_span(
        &self,
        parent: Option<&ExplicitSpan>,
        flavor: Option<Flavor>,
        fun: Option<&'static str>,
        _file: &'static str,
        _line: u32,
        attrs: Vec<KeyValue>,
        name: &str,
    ) -> ExplicitSpan {
        let span = parent
            .and_then(|parent| parent.meta.get(async_id_key()).copied())
            .unwrap_or_else(|| self.fresh_span_id());
        self.push(Event::EnterManualSpan {
            span,
            tid: time::tid(),
            ts: time::now_micros(),
            name: name.to_owned(),
            flavor,
            fun,
            attrs,
        });
        let meta = MetaMap::new()
            .with(async_id_key(), span)
            .with(async_data_key(), (name.to_owned(), flavor));
        ExplicitSpan { span, meta }
    }

    fn exit_manual_span(&self, span: ExplicitSpan) {
        if span.span.is_none() {
            return;
        }
        let (name, flavor) = match span.meta.get_required(async_data_key()) {
            Ok(data) => data.clone(),
            Err(err) => {
                let err = err.to_string();
                tk_warn!(name: "exit_manual_span.missing_metadata", error = err.as_str());
                return;
            }
        };
        self.push(Event::ExitManualSpan {
            span: span.span,
            tid: time::tid(),
            ts: time::now_micros(),
            name,
            flavor,
        });
    }

    fn message(&self, _span: Option<SpanId>, attrs: Vec<KeyValue>, msg: &str) {
        self.push(Event::Message {
            tid: time::tid(),
            ts: time::now_micros(),
            msg: msg.to_owned(),
            attrs,
        });
    }

    fn counter_int(&self, name: &str, value: i64) {
        self.push(Event::Counter {
            tid: time::tid(),
            ts: time::now_micros(),
            name: name.to_owned(),
            value: CounterValue::Int(value),
        });
    }

    fn counter_float(&self, name: &str, value: f64) {
        self.push(Event::Counter {
            tid: time::tid(),
            ts: time::now_micros(),
            name: name.to_owned(),
            value: CounterValue::Float(value),
        });
    }

    fn name_thread(&self, name: &str) {
        self.push(Event::ThreadName {
            tid: time::tid(),
            name: name.to_owned(),
        });
    }

    fn name_process(&self, name: &str) {
        self.push(Event::ProcessName {
            name: name.to_owned(),
        });
    }

    fn shutdown(&self) {
        if self
            .active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        self.queue.close();
        let writer = self
            .writer
            .lock()
            .expect("writer handle lock poisoned")
            .take();
        if let Some(writer) = writer {
            // The writer exits on its own once the closed queue drains;
            // a panic there already produced a diagnostic.
            let _ = writer.join();
        }
    }
}

impl Drop for CatapultCollector {
    /// Finalizes the document if the collector was dropped without an
    /// explicit shutdown, so the writer thread is retired and the
    /// closing bracket still lands in the output.
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A scope span's registry entry, held from its define event until its
/// exit event is consumed.
struct OpenSpan {
    tid: u64,
    name: String,
    start_us: f64,
    fun: Option<&'static str>,
    attrs: Vec<KeyValue>,
}

fn write_loop(queue: &BlockingQueue<Event>, sink: Box<dyn Write + Send>) {
    let mut writer = match JsonWriter::new(sink) {
        Ok(writer) => writer,
        Err(err) => {
            let err = err.to_string();
            tk_error!(name: "writer.open_failed", error = err.as_str());
            return;
        }
    };
    let mut open_spans: HashMap<i64, OpenSpan> = HashMap::new();
    let mut local: VecDeque<Event> = VecDeque::new();

    loop {
        while let Some(event) = local.pop_front() {
            if let Err(err) = handle_event(&mut writer, &mut open_spans, event) {
                let err = err.to_string();
                tk_error!(name: "writer.io_error", error = err.as_str());
                return;
            }
        }
        if queue.transfer(&mut local).is_err() {
            break;
        }
    }

    if !open_spans.is_empty() {
        tk_warn!(name: "shutdown.unclosed_spans", count = open_spans.len());
    }
    if let Err(err) = writer.finish() {
        let err = err.to_string();
        tk_error!(name: "writer.close_failed", error = err.as_str());
    }
}

fn handle_event<W: Write>(
    writer: &mut JsonWriter<W>,
    open_spans: &mut HashMap<i64, OpenSpan>,
    event: Event,
) -> io::Result<()> {
    let pid = time::pid();
    match event {
        Event::Tick => writer.flush(),
        Event::Message {
            tid,
            ts,
            msg,
            attrs,
        } => writer.instant(pid, tid, ts, &msg, &attrs),
        Event::DefineSpan {
            span,
            tid,
            ts,
            name,
            fun,
            attrs,
        } => {
            open_spans.insert(
                span.as_i64(),
                OpenSpan {
                    tid,
                    name,
                    start_us: ts,
                    fun,
                    attrs,
                },
            );
            Ok(())
        }
        Event::ExitSpan { span, ts } => match open_spans.remove(&span.as_i64()) {
            Some(open) => writer.duration(
                pid,
                open.tid,
                ts - open.start_us,
                open.start_us,
                &open.name,
                open.fun,
                &open.attrs,
            ),
            None => {
                tk_warn!(name: "exit_span.unknown_span", span = span.as_i64());
                Ok(())
            }
        },
        Event::EnterManualSpan {
            span,
            tid,
            ts,
            name,
            flavor,
            fun,
            attrs,
        } => writer.manual_begin(
            pid,
            span.as_i64(),
            tid,
            ts,
            &name,
            flavor == Some(Flavor::Sync),
            fun,
            &attrs,
        ),
        Event::ExitManualSpan {
            span,
            tid,
            ts,
            name,
            flavor,
        } => writer.manual_end(
            pid,
            span.as_i64(),
            tid,
            ts,
            &name,
            flavor == Some(Flavor::Sync),
        ),
        Event::Counter {
            tid,
            ts,
            name,
            value,
        } => writer.counter(pid, tid, ts, &name, value),
        Event::ThreadName { tid, name } => writer.thread_name(pid, tid, &name),
        Event::ProcessName { name } => writer.process_name(pid, &name),
    }
}
