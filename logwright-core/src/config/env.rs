use super::{ConfigError, FormatterKind, LoggerRateLimit, TelemetryConfig};

/// Recognised environment variable names.
pub struct EnvKeys;

impl EnvKeys {
    pub const SERVICE_NAME: &'static str = "LOGWRIGHT_SERVICE_NAME";
    pub const LOG_LEVEL: &'static str = "LOGWRIGHT_LOG_LEVEL";
    pub const CONSOLE_FORMATTER: &'static str = "LOGWRIGHT_LOG_CONSOLE_FORMATTER";
    pub const MODULE_LEVELS: &'static str = "LOGWRIGHT_LOG_MODULE_LEVELS";
    pub const LOGGER_NAME_EMOJI: &'static str = "LOGWRIGHT_LOG_LOGGER_NAME_EMOJI_ENABLED";
    pub const DAS_EMOJI: &'static str = "LOGWRIGHT_LOG_DAS_EMOJI_ENABLED";
    pub const OMIT_TIMESTAMP: &'static str = "LOGWRIGHT_LOG_OMIT_TIMESTAMP";
    pub const COLORS: &'static str = "LOGWRIGHT_LOG_COLORS";
    pub const RATE_LIMIT_ENABLED: &'static str = "LOGWRIGHT_LOG_RATE_LIMIT_ENABLED";
    pub const RATE_LIMIT_GLOBAL: &'static str = "LOGWRIGHT_LOG_RATE_LIMIT_GLOBAL";
    pub const RATE_LIMIT_GLOBAL_CAPACITY: &'static str = "LOGWRIGHT_LOG_RATE_LIMIT_GLOBAL_CAPACITY";
    pub const RATE_LIMIT_PER_LOGGER: &'static str = "LOGWRIGHT_LOG_RATE_LIMIT_PER_LOGGER";
    pub const SANITIZATION_ENABLED: &'static str = "LOGWRIGHT_LOG_SANITIZATION_ENABLED";

    pub const ALL: [&'static str; 13] = [
        Self::SERVICE_NAME,
        Self::LOG_LEVEL,
        Self::CONSOLE_FORMATTER,
        Self::MODULE_LEVELS,
        Self::LOGGER_NAME_EMOJI,
        Self::DAS_EMOJI,
        Self::OMIT_TIMESTAMP,
        Self::COLORS,
        Self::RATE_LIMIT_ENABLED,
        Self::RATE_LIMIT_GLOBAL,
        Self::RATE_LIMIT_GLOBAL_CAPACITY,
        Self::RATE_LIMIT_PER_LOGGER,
        Self::SANITIZATION_ENABLED,
    ];
}

impl TelemetryConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unset variables keep their defaults. Level strings are copied verbatim
    /// and only checked at setup time; toggles and numbers are checked here.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = TelemetryConfig::default();
        let logging = &mut cfg.logging;

        if let Some(name) = lookup(EnvKeys::SERVICE_NAME).filter(|s| !s.trim().is_empty()) {
            cfg.service_name = Some(name);
        }

        if let Some(level) = lookup(EnvKeys::LOG_LEVEL) {
            logging.default_level = level.trim().to_string();
        }

        if let Some(raw) = lookup(EnvKeys::CONSOLE_FORMATTER) {
            raw.parse::<FormatterKind>()
                .map_err(|_| ConfigError::env(EnvKeys::CONSOLE_FORMATTER, &raw, "expected json or key_value"))?;
            logging.console_formatter = raw.trim().to_string();
        }

        if let Some(raw) = lookup(EnvKeys::MODULE_LEVELS) {
            for (module, level) in parse_module_levels(&raw)? {
                logging.module_levels.insert(module, level);
            }
        }

        if let Some(v) = parse_bool(&lookup, EnvKeys::LOGGER_NAME_EMOJI)? {
            logging.logger_name_emoji_prefix_enabled = v;
        }
        if let Some(v) = parse_bool(&lookup, EnvKeys::DAS_EMOJI)? {
            logging.das_emoji_prefix_enabled = v;
        }
        if let Some(v) = parse_bool(&lookup, EnvKeys::OMIT_TIMESTAMP)? {
            logging.omit_timestamp = v;
        }
        if let Some(v) = parse_bool(&lookup, EnvKeys::COLORS)? {
            logging.colors = v;
        }
        if let Some(v) = parse_bool(&lookup, EnvKeys::SANITIZATION_ENABLED)? {
            logging.sanitization.enabled = v;
        }

        let rate_limit = &mut logging.rate_limit;
        if let Some(v) = parse_bool(&lookup, EnvKeys::RATE_LIMIT_ENABLED)? {
            rate_limit.enabled = v;
        }
        if let Some(v) = parse_f64(&lookup, EnvKeys::RATE_LIMIT_GLOBAL)? {
            rate_limit.global_rate = Some(v);
        }
        if let Some(v) = parse_f64(&lookup, EnvKeys::RATE_LIMIT_GLOBAL_CAPACITY)? {
            rate_limit.global_capacity = Some(v);
        }
        if let Some(raw) = lookup(EnvKeys::RATE_LIMIT_PER_LOGGER) {
            rate_limit.per_logger.extend(parse_per_logger(&raw)?);
        }

        Ok(cfg)
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        "" => Ok(None),
        _ => Err(ConfigError::env(key, &raw, "expected a boolean")),
    }
}

fn parse_f64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ConfigError::env(key, &raw, "expected a number"))
}

/// `auth.service:TRACE,database:ERROR`
fn parse_module_levels(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut out = Vec::new();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((module, level)) = pair.rsplit_once(':') else {
            return Err(ConfigError::env(
                EnvKeys::MODULE_LEVELS,
                raw,
                format!("'{pair}' is not in name:LEVEL form"),
            ));
        };

        let module = module.trim();
        if module.is_empty() {
            return Err(ConfigError::env(
                EnvKeys::MODULE_LEVELS,
                raw,
                format!("'{pair}' has an empty module name"),
            ));
        }

        out.push((module.to_string(), level.trim().to_string()));
    }

    Ok(out)
}

/// `noisy.module:5:10,other:1:1` (name:rate:capacity)
fn parse_per_logger(raw: &str) -> Result<Vec<(String, LoggerRateLimit)>, ConfigError> {
    let mut out = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        let [name, rate, capacity] = parts.as_slice() else {
            return Err(ConfigError::env(
                EnvKeys::RATE_LIMIT_PER_LOGGER,
                raw,
                format!("'{entry}' is not in name:rate:capacity form"),
            ));
        };

        let parse = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                ConfigError::env(
                    EnvKeys::RATE_LIMIT_PER_LOGGER,
                    raw,
                    format!("'{s}' in '{entry}' is not a number"),
                )
            })
        };

        out.push((
            name.to_string(),
            LoggerRateLimit {
                rate: parse(rate)?,
                capacity: parse(capacity)?,
            },
        ));
    }

    Ok(out)
}
