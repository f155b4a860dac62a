use crate::event::LogEvent;
use crate::sink::{ConsoleSink, Sink};
use std::fmt::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

const PREFIX: &str = "[logwright]";

/// Last-resort output used when setup failed or a sink or stage faulted.
///
/// Lines are written straight to the underlying sink with no enrichment,
/// no filtering and no rate limiting. Write failures and panics are ignored.
#[derive(Clone)]
pub struct EmergencyWriter {
    sink: Arc<dyn Sink>,
}

impl EmergencyWriter {
    pub fn stderr() -> Self {
        Self::to_sink(Arc::new(ConsoleSink::stderr()))
    }

    pub fn to_sink(sink: Arc<dyn Sink>) -> Self {
        Self { sink }
    }

    /// Minimal rendering of an application event.
    pub fn write_event(&self, event: &LogEvent) {
        let mut line = format!(
            "{PREFIX} {} {}: {}",
            event.level.as_upper_str(),
            event.logger_name,
            event.message
        );
        for (key, value) in event.fields.iter() {
            let _ = write!(line, " {key}={value}");
        }
        self.write_line(line);
    }

    /// Report an internal fault.
    pub fn report(&self, message: &str) {
        self.write_line(format!("{PREFIX} {message}"));
    }

    fn write_line(&self, mut line: String) {
        line.push('\n');
        let _ = catch_unwind(AssertUnwindSafe(|| self.sink.write(line.as_bytes())));
    }
}

impl Default for EmergencyWriter {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for EmergencyWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmergencyWriter")
            .field("sink", &self.sink.name())
            .finish()
    }
}
