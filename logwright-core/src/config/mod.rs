//! Configuration values consumed by the setup coordinator.
//!
//! Levels and the formatter kind are kept as the raw strings the caller (or the
//! environment) supplied. They are resolved, and rejected if malformed, when the
//! coordinator builds the pipeline.

mod env;
mod error;

pub use env::EnvKeys;
pub use error::ConfigError;

use crate::level::Level;
use crate::ratelimit::{OverflowPolicy, RateLimitError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

// ----------------------------------------------------------------------------
// Formatter
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterKind {
    Json,
    KeyValue,
}

impl FromStr for FormatterKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(FormatterKind::Json),
            "key_value" | "keyvalue" | "kv" => Ok(FormatterKind::KeyValue),
            _ => Err(ConfigError::InvalidFormatter {
                value: s.to_string(),
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// Rate limiting
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitMode {
    /// Reject immediately when no token is available.
    #[default]
    Drop,
    /// Buffer overflow events and drain them from a background worker.
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LoggerRateLimit {
    pub rate: f64,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Global refill rate in events per second.
    pub global_rate: Option<f64>,
    /// Global burst capacity; defaults to `global_rate` when unset.
    pub global_capacity: Option<f64>,
    /// Exact logger-name overrides, consulted before the global bucket.
    pub per_logger: BTreeMap<String, LoggerRateLimit>,
    pub mode: RateLimitMode,
    pub max_queue_size: usize,
    pub max_queue_bytes: Option<usize>,
    pub overflow_policy: OverflowPolicy,
    /// Timeout for queue admission under the `block` policy.
    pub queue_timeout_ms: u64,
    pub emit_warning_on_limit: bool,
    pub warning_interval_secs: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            global_rate: None,
            global_capacity: None,
            per_logger: BTreeMap::new(),
            mode: RateLimitMode::Drop,
            max_queue_size: 1000,
            max_queue_bytes: None,
            overflow_policy: OverflowPolicy::Block,
            queue_timeout_ms: 50,
            emit_warning_on_limit: true,
            warning_interval_secs: 60.0,
        }
    }
}

impl RateLimitConfig {
    /// Whether any bucket would be built from this config.
    pub fn is_active(&self) -> bool {
        self.enabled && (self.global_rate.is_some() || !self.per_logger.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_active() {
            return Ok(());
        }

        if let Some(rate) = self.global_rate {
            let capacity = self.global_capacity.unwrap_or(rate);
            check_bucket(rate, capacity).map_err(|e| ConfigError::rate_limit("global", e))?;
        }

        for (name, limit) in &self.per_logger {
            check_bucket(limit.rate, limit.capacity)
                .map_err(|e| ConfigError::rate_limit(format!("logger '{name}'"), e))?;
        }

        if self.mode == RateLimitMode::Queue && self.max_queue_size == 0 {
            return Err(ConfigError::rate_limit(
                "queue",
                RateLimitError::InvalidQueueSize,
            ));
        }

        Ok(())
    }
}

fn check_bucket(rate: f64, capacity: f64) -> Result<(), RateLimitError> {
    crate::ratelimit::TokenBucket::new(capacity, rate).map(|_| ())
}

// ----------------------------------------------------------------------------
// Sanitization
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizationConfig {
    pub enabled: bool,
    /// Case-insensitive glob patterns matched against field names.
    pub sensitive_keys: Vec<String>,
    /// Mask values that look like credentials regardless of their key.
    pub mask_values: bool,
    /// Recurse into nested maps and lists.
    pub sanitize_nested: bool,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitive_keys: [
                "*password*",
                "*passwd*",
                "*secret*",
                "*token*",
                "api_key",
                "apikey",
                "authorization",
                "*credential*",
                "private_key",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            mask_values: true,
            sanitize_nested: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Logging / Telemetry
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub default_level: String,
    pub console_formatter: String,
    /// Dotted logger-name prefix -> level.
    pub module_levels: BTreeMap<String, String>,
    pub logger_name_emoji_prefix_enabled: bool,
    pub das_emoji_prefix_enabled: bool,
    pub omit_timestamp: bool,
    /// ANSI colours in the key-value renderer.
    pub colors: bool,
    pub rate_limit: RateLimitConfig,
    pub sanitization: SanitizationConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: "WARNING".to_string(),
            console_formatter: "key_value".to_string(),
            module_levels: BTreeMap::new(),
            logger_name_emoji_prefix_enabled: true,
            das_emoji_prefix_enabled: true,
            omit_timestamp: false,
            colors: false,
            rate_limit: RateLimitConfig::default(),
            sanitization: SanitizationConfig::default(),
        }
    }
}

impl LoggingConfig {
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn with_module_level(mut self, prefix: impl Into<String>, level: impl Into<String>) -> Self {
        self.module_levels.insert(prefix.into(), level.into());
        self
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.console_formatter = formatter.into();
        self
    }

    pub fn default_level(&self) -> Result<Level, ConfigError> {
        self.default_level
            .parse()
            .map_err(|_| ConfigError::InvalidDefaultLevel {
                value: self.default_level.clone(),
            })
    }

    pub fn formatter(&self) -> Result<FormatterKind, ConfigError> {
        self.console_formatter.parse()
    }

    pub fn module_levels(&self) -> Result<Vec<(String, Level)>, ConfigError> {
        self.module_levels
            .iter()
            .map(|(module, raw)| {
                raw.parse()
                    .map(|level| (module.clone(), level))
                    .map_err(|_| ConfigError::InvalidModuleLevel {
                        module: module.clone(),
                        value: raw.clone(),
                    })
            })
            .collect()
    }

    /// Check every raw value without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.default_level()?;
        self.formatter()?;
        self.module_levels()?;
        self.rate_limit.validate()?;
        for pattern in &self.sanitization.sensitive_keys {
            glob::Pattern::new(&pattern.to_ascii_lowercase()).map_err(|source| {
                ConfigError::InvalidKeyPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    pub service_name: Option<String>,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(logging: LoggingConfig) -> Self {
        Self {
            service_name: None,
            logging,
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()
    }
}

#[cfg(test)]
mod tests;
