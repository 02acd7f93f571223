#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A `Write` sink shared between the collector's writer thread and the
/// test, so the finished document can be inspected after shutdown.
#[derive(Clone, Default)]
pub struct SharedBuf {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new() -> Self {
        SharedBuf::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Parses the document and returns its event objects.
pub fn events(document: &str) -> Vec<serde_json::Value> {
    let parsed: serde_json::Value = serde_json::from_str(document).expect("valid JSON document");
    parsed.as_array().expect("top-level JSON array").clone()
}
