pub mod check;
pub mod emit;
pub mod flood;

use anyhow::{Context, Result};
use logwright_core::TelemetryConfig;
use std::path::Path;

/// Load a JSON config file, or fall back to `LOGWRIGHT_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<TelemetryConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))
        }
        None => Ok(TelemetryConfig::from_env()?),
    }
}
