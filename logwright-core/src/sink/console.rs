use super::Sink;
use crate::sync::lock;
use std::io::{self, Write};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Writes each line to stdout or stderr while holding the stream lock, so
/// lines from different threads never interleave.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: Stream,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    pub fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        match self.stream {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }

    fn write(&self, line: &[u8]) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().lock().write_all(line),
            Stream::Stderr => io::stderr().lock().write_all(line),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().lock().flush(),
            Stream::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Adapts any [`Write`] into a sink.
pub struct WriterSink<W> {
    name: String,
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, line: &[u8]) -> io::Result<()> {
        lock(&self.inner).write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.inner).flush()
    }
}
