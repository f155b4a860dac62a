use logwright_core::{
    EmergencyWriter, LoggingConfig, LoggingContext, MemorySink, TelemetryConfig,
};
use serde_json::Value;
use std::sync::Arc;

/// A context whose output and emergency lines land in memory.
pub struct TestContext {
    pub context: LoggingContext,
    pub output: MemorySink,
    pub emergency: MemorySink,
}

impl TestContext {
    pub fn new(config: TelemetryConfig) -> Self {
        let output = MemorySink::new();
        let emergency = MemorySink::new();
        let context = LoggingContext::builder()
            .with_sink(output.clone())
            .with_emergency_writer(EmergencyWriter::to_sink(Arc::new(emergency.clone())))
            .with_default_config(config)
            .build();

        Self {
            context,
            output,
            emergency,
        }
    }

    /// Every output line parsed as JSON. Panics on a non-JSON line.
    pub fn json_lines(&self) -> Vec<Value> {
        self.output
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("output line is not JSON"))
            .collect()
    }
}

/// JSON output at INFO with no timestamps or emoji, so lines compare exactly.
pub fn json_config() -> TelemetryConfig {
    let mut logging = LoggingConfig::default()
        .with_default_level("INFO")
        .with_formatter("json");
    logging.omit_timestamp = true;
    logging.logger_name_emoji_prefix_enabled = false;
    logging.das_emoji_prefix_enabled = false;
    TelemetryConfig::new(logging)
}
