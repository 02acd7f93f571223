use std::borrow::Cow;
use std::fmt;

/// The value part of attribute [`KeyValue`] pairs.
///
/// A small dynamically typed value attached to spans, messages, and
/// counters. Attribute values survive until the collector has serialized
/// the event that carries them.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    /// No value.
    None,
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// String value.
    Str(Cow<'static, str>),
    /// 64-bit float.
    Float(f64),
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::None => f.write_str("none"),
            Datum::Int(i) => i.fmt(f),
            Datum::Bool(b) => b.fmt(f),
            Datum::Str(s) => s.fmt(f),
            Datum::Float(v) => v.fmt(f),
        }
    }
}

macro_rules! into_datum {
    ($(($t:ty, $variant:expr),)+) => {
        $(
            impl From<$t> for Datum {
                fn from(value: $t) -> Self {
                    $variant(value.into())
                }
            }
        )+
    }
}

into_datum!(
    (i64, Datum::Int),
    (i32, Datum::Int),
    (u32, Datum::Int),
    (bool, Datum::Bool),
    (f64, Datum::Float),
    (&'static str, Datum::Str),
    (String, Datum::Str),
    (Cow<'static, str>, Datum::Str),
);

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Datum::None,
        }
    }
}

/// A key-value attribute pair.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// The attribute's display name.
    pub key: Cow<'static, str>,
    /// The attribute's value.
    pub value: Datum,
}

impl KeyValue {
    /// Create a new attribute pair.
    ///
    /// ```
    /// use tracekit::KeyValue;
    ///
    /// let kv = KeyValue::new("http.status", 200);
    /// ```
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Datum>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
