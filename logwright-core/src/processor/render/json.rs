use super::Renderer;
use crate::event::LogEvent;
use crate::processor::core::errors::ProcessorError;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Keys the renderer writes itself. A user field with one of these names is
/// emitted under `field.<name>` instead, or `field.<name>.<n>` when the caller
/// already supplied `field.<name>`.
pub const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "logger", "event"];

/// One JSON object per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

struct JsonLine<'a> {
    event: &'a LogEvent,
    timestamp: Option<&'a str>,
}

impl Serialize for JsonLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let event = self.event;
        let mut map = serializer.serialize_map(None)?;
        if let Some(ts) = self.timestamp {
            map.serialize_entry("timestamp", ts)?;
        }
        map.serialize_entry("level", event.level.as_str())?;
        map.serialize_entry("logger", &event.logger_name)?;
        map.serialize_entry("event", &event.message)?;
        for (key, value) in event.fields.iter() {
            if RESERVED_KEYS.contains(&key) {
                map.serialize_entry(&renamed_key(event, key), value)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

fn renamed_key(event: &LogEvent, key: &str) -> String {
    let base = format!("field.{key}");
    if !event.fields.contains_key(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}.{n}"))
        .find(|candidate| !event.fields.contains_key(candidate))
        .unwrap_or(base)
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, event: &LogEvent, timestamp: Option<&str>) -> Result<String, ProcessorError> {
        serde_json::to_string(&JsonLine { event, timestamp })
            .map_err(|e| ProcessorError::new(self.name(), e.to_string()))
    }
}
