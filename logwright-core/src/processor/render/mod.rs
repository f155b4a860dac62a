//! Terminal formatting: an optional timestamp sub-stage followed by exactly
//! one renderer.

mod json;
mod key_value;

pub use json::JsonRenderer;
pub use key_value::KeyValueRenderer;

use crate::config::FormatterKind;
use crate::event::LogEvent;
use crate::processor::core::errors::ProcessorError;
use chrono::SecondsFormat;
use std::sync::Arc;

/// Turns a fully processed event into one output line (no trailing newline).
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, event: &LogEvent, timestamp: Option<&str>) -> Result<String, ProcessorError>;
}

pub const TIMESTAMP_STAGE: &str = "timestamp";

#[derive(Clone)]
pub struct TerminalFormatter {
    timestamps: bool,
    renderer: Arc<dyn Renderer>,
}

impl TerminalFormatter {
    pub fn new(timestamps: bool, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            timestamps,
            renderer,
        }
    }

    pub fn for_kind(kind: FormatterKind, timestamps: bool, colors: bool) -> Self {
        let renderer: Arc<dyn Renderer> = match kind {
            FormatterKind::Json => Arc::new(JsonRenderer),
            FormatterKind::KeyValue => Arc::new(KeyValueRenderer::new(colors)),
        };
        Self::new(timestamps, renderer)
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    pub fn emits_timestamps(&self) -> bool {
        self.timestamps
    }

    pub(crate) fn stage_names(&self) -> impl Iterator<Item = &'static str> {
        self.timestamps
            .then_some(TIMESTAMP_STAGE)
            .into_iter()
            .chain(std::iter::once(self.renderer.name()))
    }

    pub fn format(&self, event: &LogEvent) -> Result<String, ProcessorError> {
        let timestamp = self.timestamps.then(|| format_timestamp(event));
        self.renderer.render(event, timestamp.as_deref())
    }

    /// Minimal line used when the renderer itself fails.
    pub fn fallback(&self, event: &LogEvent) -> String {
        format!(
            "{} {}: {}",
            event.level.as_upper_str(),
            event.logger_name,
            event.message
        )
    }
}

impl std::fmt::Debug for TerminalFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalFormatter")
            .field("timestamps", &self.timestamps)
            .field("renderer", &self.renderer.name())
            .finish()
    }
}

/// RFC 3339, UTC, millisecond precision.
pub fn format_timestamp(event: &LogEvent) -> String {
    event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
