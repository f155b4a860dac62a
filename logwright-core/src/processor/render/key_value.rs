use super::Renderer;
use crate::event::{FieldValue, LogEvent};
use crate::level::Level;
use crate::processor::core::errors::ProcessorError;
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Human-oriented single-line output:
///
/// ```text
/// 2025-01-01T12:00:00.000Z [info     ] 🔐 [🔑][➡️][✅] User login logger=auth.service user_id=42
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueRenderer {
    colors: bool,
}

/// Width of the bracketed level column.
const LEVEL_WIDTH: usize = 9;

impl KeyValueRenderer {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    fn write_level(&self, out: &mut String, level: Level) -> std::fmt::Result {
        let label = format!("{:<LEVEL_WIDTH$}", level.as_str());
        if !self.colors {
            return write!(out, "[{label}]");
        }
        match level {
            Level::Trace => write!(out, "[{}]", label.dimmed()),
            Level::Debug => write!(out, "[{}]", label.blue()),
            Level::Info => write!(out, "[{}]", label.green()),
            Level::Warning => write!(out, "[{}]", label.yellow()),
            Level::Error => write!(out, "[{}]", label.red()),
            Level::Critical => write!(out, "[{}]", label.red().bold()),
        }
    }

    fn write_pair(&self, out: &mut String, key: &str, value: &FieldValue) -> std::fmt::Result {
        out.push(' ');
        if self.colors {
            write!(out, "{}=", key.cyan())?;
        } else {
            write!(out, "{key}=")?;
        }
        match value {
            FieldValue::Str(s) if needs_quotes(s) => write!(out, "{s:?}"),
            other => write!(out, "{other}"),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"')
}

impl Renderer for KeyValueRenderer {
    fn name(&self) -> &'static str {
        "key_value"
    }

    fn render(&self, event: &LogEvent, timestamp: Option<&str>) -> Result<String, ProcessorError> {
        let fail = |e: std::fmt::Error| ProcessorError::new(self.name(), e.to_string());

        let mut out = String::with_capacity(64 + event.message.len());
        if let Some(ts) = timestamp {
            if self.colors {
                write!(out, "{} ", ts.dimmed()).map_err(fail)?;
            } else {
                write!(out, "{ts} ").map_err(fail)?;
            }
        }
        self.write_level(&mut out, event.level).map_err(fail)?;

        out.push(' ');
        if self.colors {
            write!(out, "{}", event.message.bold()).map_err(fail)?;
        } else {
            out.push_str(&event.message);
        }

        self.write_pair(&mut out, "logger", &FieldValue::Str(event.logger_name.clone()))
            .map_err(fail)?;
        for (key, value) in event.fields.iter() {
            self.write_pair(&mut out, key, value).map_err(fail)?;
        }
        Ok(out)
    }
}
