#![allow(unused_macros)]
//! Self-diagnostics macros.
//!
//! These macros carry this crate's (and its backends') own diagnostics
//! (unclosed spans at shutdown, writer I/O failures, lifecycle events)
//! out through the `tracing` ecosystem when the `internal-logs` feature
//! is enabled, and compile to nothing otherwise. They are not a general
//! logging facility for applications.

/// Log an internal debug event.
///
/// ```
/// use tracekit::tk_debug;
/// tk_debug!(name: "collector.start", output = "stdout");
/// ```
#[macro_export]
macro_rules! tk_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::debug!(target: env!("CARGO_PKG_NAME"), name = $name, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::debug!(target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Log an internal warning.
///
/// ```
/// use tracekit::tk_warn;
/// tk_warn!(name: "shutdown.unclosed_spans", count = 3usize);
/// ```
#[macro_export]
macro_rules! tk_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::warn!(target: env!("CARGO_PKG_NAME"), name = $name, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::warn!(target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Log an internal error.
///
/// ```
/// use tracekit::tk_error;
/// tk_error!(name: "writer.io_error", error = "broken pipe");
/// ```
#[macro_export]
macro_rules! tk_error {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::error!(target: env!("CARGO_PKG_NAME"), name = $name, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            tracing::error!(target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+, "");
        }
        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}
