//! The stateful Catapult JSON document writer.
//!
//! Append-only over any [`Write`] sink: `[` on creation, one event
//! object per emission with `,\n` separators, `]` plus a flush on
//! [`JsonWriter::finish`]. Already-emitted bytes are never revisited, so
//! a truncated document is still a prefix of a valid one.
//!
//! Field order within each event object is fixed so traces can be
//! compared textually in tests. Timestamps and durations are
//! microseconds with exactly two fractional digits.

use std::io::{self, Write};

use tracekit::{Datum, KeyValue};

use crate::event::CounterValue;

pub(crate) struct JsonWriter<W: Write> {
    out: W,
    first: bool,
}

impl<W: Write> JsonWriter<W> {
    /// Opens the document, writing the leading `[`.
    pub fn new(mut out: W) -> io::Result<Self> {
        out.write_all(b"[")?;
        Ok(JsonWriter { out, first: true })
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Closes the document: writes the trailing `]` and flushes. The
    /// sink is dropped (closing any file the backend opened).
    pub fn finish(mut self) -> io::Result<()> {
        self.out.write_all(b"]")?;
        self.out.flush()
    }

    fn separator(&mut self) -> io::Result<()> {
        if self.first {
            self.first = false;
            Ok(())
        } else {
            self.out.write_all(b",\n")
        }
    }

    /// Writes `s` as a JSON string. `"`, `\`, and the common control
    /// characters get their short escapes; any other byte at or below
    /// 0x1f becomes `\u00xx`; everything else passes through verbatim
    /// (the input is assumed to be well-formed UTF-8).
    fn string(&mut self, s: &str) -> io::Result<()> {
        let bytes = s.as_bytes();
        self.out.write_all(b"\"")?;
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            if b != b'"' && b != b'\\' && b > 0x1f {
                continue;
            }
            self.out.write_all(&bytes[start..i])?;
            match b {
                b'"' => self.out.write_all(b"\\\"")?,
                b'\\' => self.out.write_all(b"\\\\")?,
                b'\n' => self.out.write_all(b"\\n")?,
                b'\r' => self.out.write_all(b"\\r")?,
                b'\t' => self.out.write_all(b"\\t")?,
                0x08 => self.out.write_all(b"\\b")?,
                other => write!(self.out, "\\u{:04x}", other)?,
            }
            start = i + 1;
        }
        self.out.write_all(&bytes[start..])?;
        self.out.write_all(b"\"")
    }

    fn datum(&mut self, value: &Datum) -> io::Result<()> {
        match value {
            Datum::None => self.out.write_all(b"null"),
            Datum::Int(i) => write!(self.out, "{i}"),
            Datum::Bool(b) => write!(self.out, "{b}"),
            Datum::Str(s) => self.string(s),
            Datum::Float(f) => write!(self.out, "{f}"),
            _ => self.out.write_all(b"null"),
        }
    }

    /// Writes the `args` object. The enclosing function name, when
    /// known, is surfaced as a `"function"` entry ahead of the
    /// attributes.
    fn args(&mut self, fun: Option<&str>, attrs: &[KeyValue]) -> io::Result<()> {
        self.out.write_all(b"\"args\":{")?;
        let mut first = true;
        if let Some(fun) = fun {
            self.string("function")?;
            self.out.write_all(b":")?;
            self.string(fun)?;
            first = false;
        }
        for kv in attrs {
            if !first {
                self.out.write_all(b",")?;
            }
            first = false;
            self.string(&kv.key)?;
            self.out.write_all(b":")?;
            self.datum(&kv.value)?;
        }
        self.out.write_all(b"}")
    }

    fn maybe_args(&mut self, fun: Option<&str>, attrs: &[KeyValue]) -> io::Result<()> {
        if fun.is_none() && attrs.is_empty() {
            return Ok(());
        }
        self.out.write_all(b",")?;
        self.args(fun, attrs)
    }

    /// A complete duration event (`ph: "X"`).
    #[allow(clippy::too_many_arguments)]
    pub fn duration(
        &mut self,
        pid: u64,
        tid: u64,
        dur: f64,
        ts: f64,
        name: &str,
        fun: Option<&str>,
        attrs: &[KeyValue],
    ) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"cat\":\"\",\"tid\":{tid},\"dur\":{dur:.2},\"ts\":{ts:.2},\"name\":"
        )?;
        self.string(name)?;
        self.out.write_all(b",\"ph\":\"X\"")?;
        self.maybe_args(fun, attrs)?;
        self.out.write_all(b"}")
    }

    /// An instant event (`ph: "I"`).
    pub fn instant(
        &mut self,
        pid: u64,
        tid: u64,
        ts: f64,
        name: &str,
        attrs: &[KeyValue],
    ) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"cat\":\"\",\"tid\":{tid},\"ts\":{ts:.2},\"name\":"
        )?;
        self.string(name)?;
        self.out.write_all(b",\"ph\":\"I\"")?;
        self.maybe_args(None, attrs)?;
        self.out.write_all(b"}")
    }

    /// A manual span's begin event: `ph: "B"` when the span is
    /// thread-bound, `ph: "b"` (async) otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn manual_begin(
        &mut self,
        pid: u64,
        id: i64,
        tid: u64,
        ts: f64,
        name: &str,
        sync: bool,
        fun: Option<&str>,
        attrs: &[KeyValue],
    ) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"cat\":\"trace\",\"id\":{id},\"tid\":{tid},\"ts\":{ts:.2},\"name\":"
        )?;
        self.string(name)?;
        write!(self.out, ",\"ph\":\"{}\"", if sync { 'B' } else { 'b' })?;
        self.maybe_args(fun, attrs)?;
        self.out.write_all(b"}")
    }

    /// A manual span's end event: `ph: "E"` / `ph: "e"`.
    pub fn manual_end(
        &mut self,
        pid: u64,
        id: i64,
        tid: u64,
        ts: f64,
        name: &str,
        sync: bool,
    ) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"cat\":\"trace\",\"id\":{id},\"tid\":{tid},\"ts\":{ts:.2},\"name\":"
        )?;
        self.string(name)?;
        write!(self.out, ",\"ph\":\"{}\"}}", if sync { 'E' } else { 'e' })
    }

    /// A counter sample (`ph: "C"`): the event name is the literal `"c"`,
    /// the counter's display name keys the single `args` entry.
    pub fn counter(
        &mut self,
        pid: u64,
        tid: u64,
        ts: f64,
        name: &str,
        value: CounterValue,
    ) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"tid\":{tid},\"ts\":{ts:.2},\"name\":\"c\",\"ph\":\"C\",\"args\":{{"
        )?;
        self.string(name)?;
        self.out.write_all(b":")?;
        match value {
            CounterValue::Int(i) => write!(self.out, "{i}")?,
            CounterValue::Float(f) => write!(self.out, "{f}")?,
        }
        self.out.write_all(b"}}")
    }

    /// A thread display-name metadata event (`ph: "M"`).
    pub fn thread_name(&mut self, pid: u64, tid: u64, name: &str) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"tid\":{tid},\"name\":\"thread_name\",\"ph\":\"M\",\"args\":{{\"name\":"
        )?;
        self.string(name)?;
        self.out.write_all(b"}}")
    }

    /// A process display-name metadata event (`ph: "M"`).
    pub fn process_name(&mut self, pid: u64, name: &str) -> io::Result<()> {
        self.separator()?;
        write!(
            self.out,
            "{{\"pid\":{pid},\"name\":\"process_name\",\"ph\":\"M\",\"args\":{{\"name\":"
        )?;
        self.string(name)?;
        self.out.write_all(b"}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<F>(emit: F) -> String
    where
        F: FnOnce(&mut JsonWriter<&mut Vec<u8>>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        let mut writer = JsonWriter::new(&mut buf).unwrap();
        emit(&mut writer).unwrap();
        writer.finish().unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_document() {
        assert_eq!(collect(|_| Ok(())), "[]");
    }

    #[test]
    fn duration_without_args() {
        let out = collect(|w| w.duration(2, 3, 1.0, 0.0, "a", None, &[]));
        assert_eq!(
            out,
            r#"[{"pid":2,"cat":"","tid":3,"dur":1.00,"ts":0.00,"name":"a","ph":"X"}]"#
        );
    }

    #[test]
    fn duration_with_function_and_attrs() {
        let attrs = vec![KeyValue::new("n", 7i64)];
        let out = collect(|w| w.duration(2, 3, 2.5, 1.25, "a", Some("main"), &attrs));
        assert_eq!(
            out,
            r#"[{"pid":2,"cat":"","tid":3,"dur":2.50,"ts":1.25,"name":"a","ph":"X","args":{"function":"main","n":7}}]"#
        );
    }

    #[test]
    fn events_are_separated_by_comma_newline() {
        let out = collect(|w| {
            w.instant(2, 3, 0.0, "one", &[])?;
            w.instant(2, 3, 1.0, "two", &[])
        });
        assert_eq!(
            out,
            "[{\"pid\":2,\"cat\":\"\",\"tid\":3,\"ts\":0.00,\"name\":\"one\",\"ph\":\"I\"},\n\
             {\"pid\":2,\"cat\":\"\",\"tid\":3,\"ts\":1.00,\"name\":\"two\",\"ph\":\"I\"}]"
        );
    }

    #[test]
    fn string_escaping() {
        let out = collect(|w| w.instant(2, 3, 0.0, "a\"b\nc", &[]));
        assert!(out.contains(r#""name":"a\"b\nc""#));

        let out = collect(|w| w.instant(2, 3, 0.0, "t\tr\rb\x08\\", &[]));
        assert!(out.contains(r#""name":"t\tr\rb\b\\""#));

        // other control characters become \u00xx with lowercase hex
        let out = collect(|w| w.instant(2, 3, 0.0, "v\x0b\x1f", &[]));
        assert!(out.contains(r#""name":"v\u000b\u001f""#));
    }

    #[test]
    fn datum_serialization() {
        let attrs = vec![
            KeyValue::new("i", 7i64),
            KeyValue::new("b", true),
            KeyValue::new("s", "v"),
            KeyValue::new("f", 1.5),
            KeyValue::new("n", None::<i64>),
        ];
        let out = collect(|w| w.instant(2, 3, 0.0, "m", &attrs));
        assert!(out.contains(r#""args":{"i":7,"b":true,"s":"v","f":1.5,"n":null}"#));
    }

    #[test]
    fn counter_shapes() {
        let out = collect(|w| w.counter(2, 3, 0.0, "n", CounterValue::Int(7)));
        assert_eq!(
            out,
            r#"[{"pid":2,"tid":3,"ts":0.00,"name":"c","ph":"C","args":{"n":7}}]"#
        );

        let out = collect(|w| w.counter(2, 3, 1.0, "load", CounterValue::Float(0.75)));
        assert!(out.contains(r#""args":{"load":0.75}"#));
    }

    #[test]
    fn manual_span_phases() {
        let out = collect(|w| {
            w.manual_begin(2, 0, 3, 0.0, "req", false, None, &[])?;
            w.manual_end(2, 0, 3, 1.0, "req", false)?;
            w.manual_begin(2, 1, 3, 2.0, "step", true, None, &[])?;
            w.manual_end(2, 1, 3, 3.0, "step", true)
        });
        assert!(out.contains(r#"{"pid":2,"cat":"trace","id":0,"tid":3,"ts":0.00,"name":"req","ph":"b"}"#));
        assert!(out.contains(r#"{"pid":2,"cat":"trace","id":0,"tid":3,"ts":1.00,"name":"req","ph":"e"}"#));
        assert!(out.contains(r#""ph":"B""#));
        assert!(out.contains(r#""ph":"E""#));
    }

    #[test]
    fn name_metadata_events() {
        let out = collect(|w| {
            w.process_name(2, "svc")?;
            w.thread_name(2, 3, "worker")
        });
        assert!(out.contains(r#"{"pid":2,"name":"process_name","ph":"M","args":{"name":"svc"}}"#));
        assert!(out.contains(r#"{"pid":2,"tid":3,"name":"thread_name","ph":"M","args":{"name":"worker"}}"#));
    }
}
