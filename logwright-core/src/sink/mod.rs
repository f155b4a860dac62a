//! Output destinations.
//!
//! Sinks receive fully rendered lines (newline included) and serialise their
//! own writes. A sink that fails is reported once and skipped from then on.

mod console;
mod memory;
#[cfg(feature = "rolling_file")]
mod rolling;

pub use console::{ConsoleSink, Stream, WriterSink};
pub use memory::MemorySink;
#[cfg(feature = "rolling_file")]
pub use rolling::{FileRotation, RollingFileSink};

use crate::emergency::EmergencyWriter;
use crate::sync::panic_message;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, line: &[u8]) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.flush()
    }
}

struct SinkEntry {
    sink: Arc<dyn Sink>,
    degraded: AtomicBool,
}

/// The sinks attached to one logging context, with per-sink health.
pub struct SinkSet {
    entries: Vec<SinkEntry>,
}

impl SinkSet {
    pub fn new(sinks: impl IntoIterator<Item = Arc<dyn Sink>>) -> Self {
        Self {
            entries: sinks
                .into_iter()
                .map(|sink| SinkEntry {
                    sink,
                    degraded: AtomicBool::new(false),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write one rendered line to every healthy sink. Returns how many
    /// sinks accepted it.
    pub fn write_line(&self, line: &str, emergency: &EmergencyWriter) -> usize {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut written = 0;
        for entry in self.healthy() {
            match guarded(|| entry.sink.write(buf.as_bytes())) {
                Ok(()) => written += 1,
                Err(err) => self.degrade(entry, "write", &err, emergency),
            }
        }
        written
    }

    pub fn flush(&self, emergency: &EmergencyWriter) {
        for entry in self.healthy() {
            if let Err(err) = guarded(|| entry.sink.flush()) {
                self.degrade(entry, "flush", &err, emergency);
            }
        }
    }

    pub fn close(&self, emergency: &EmergencyWriter) {
        for entry in self.healthy() {
            if let Err(err) = guarded(|| entry.sink.close()) {
                self.degrade(entry, "close", &err, emergency);
            }
        }
    }

    /// Names of sinks that have been disabled after a failure.
    pub fn degraded(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.degraded.load(Ordering::Acquire))
            .map(|e| e.sink.name().to_string())
            .collect()
    }

    fn healthy(&self) -> impl Iterator<Item = &SinkEntry> {
        self.entries
            .iter()
            .filter(|e| !e.degraded.load(Ordering::Acquire))
    }

    fn degrade(&self, entry: &SinkEntry, op: &str, err: &io::Error, emergency: &EmergencyWriter) {
        if entry.degraded.swap(true, Ordering::AcqRel) {
            return;
        }
        let name = entry.sink.name();
        tracing::warn!(event = "sink_degraded", sink = name, op, error = %err);
        emergency.report(&format!("sink '{name}' failed on {op} and is now disabled: {err}"));
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.sink.name()))
            .finish()
    }
}

/// Run a sink call, turning a panic into an I/O error.
fn guarded(op: impl FnOnce() -> io::Result<()>) -> io::Result<()> {
    catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| {
        Err(io::Error::other(format!(
            "sink panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}
