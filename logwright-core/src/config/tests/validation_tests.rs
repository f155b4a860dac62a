use crate::config::{
    ConfigError, FormatterKind, LoggerRateLimit, LoggingConfig, RateLimitConfig, RateLimitMode,
    TelemetryConfig,
};
use crate::level::Level;
use crate::ratelimit::RateLimitError;
use pretty_assertions::assert_eq;

fn active_rate_limit() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        global_rate: Some(10.0),
        ..RateLimitConfig::default()
    }
}

#[test]
fn defaults_validate() {
    let cfg = LoggingConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.default_level().unwrap(), Level::Warning);
    assert_eq!(cfg.formatter().unwrap(), FormatterKind::KeyValue);
}

#[test]
fn formatter_aliases() {
    for raw in ["json", "JSON", " json "] {
        assert_eq!(raw.parse::<FormatterKind>().unwrap(), FormatterKind::Json);
    }
    for raw in ["key_value", "keyvalue", "kv"] {
        assert_eq!(raw.parse::<FormatterKind>().unwrap(), FormatterKind::KeyValue);
    }
}

#[test]
fn bad_module_level_names_the_module() {
    let err = LoggingConfig::default()
        .with_module_level("database", "LOUD")
        .validate()
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid level 'LOUD' for module 'database'");
}

#[test]
fn inactive_rate_limit_skips_bucket_checks() {
    let cfg = RateLimitConfig {
        global_rate: Some(-1.0),
        ..RateLimitConfig::default()
    };
    assert!(!cfg.is_active());
    assert!(cfg.validate().is_ok());
}

#[test]
fn non_positive_rate_is_rejected() {
    let cfg = RateLimitConfig {
        global_rate: Some(0.0),
        ..active_rate_limit()
    };
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::InvalidRateLimit {
            source: RateLimitError::InvalidRefillRate(_),
            ..
        })
    ));
}

#[test]
fn per_logger_capacity_is_checked() {
    let mut cfg = active_rate_limit();
    cfg.per_logger.insert(
        "noisy".to_string(),
        LoggerRateLimit {
            rate: 1.0,
            capacity: 0.0,
        },
    );
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("logger 'noisy'"));
}

#[test]
fn queue_mode_requires_positive_size() {
    let cfg = RateLimitConfig {
        mode: RateLimitMode::Queue,
        max_queue_size: 0,
        ..active_rate_limit()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn bad_key_pattern_is_rejected() {
    let mut cfg = LoggingConfig::default();
    cfg.sanitization.sensitive_keys.push("[unclosed".to_string());
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::InvalidKeyPattern { .. })
    ));
}

#[test]
fn deserializes_partial_json_with_defaults() {
    let raw = r#"{
        "service_name": "api",
        "logging": {
            "default_level": "INFO",
            "module_levels": { "auth": "DEBUG" },
            "rate_limit": { "enabled": true, "global_rate": 5.0, "mode": "queue", "overflow_policy": "drop_oldest" }
        }
    }"#;

    let cfg: TelemetryConfig = serde_json::from_str(raw).unwrap();

    assert_eq!(cfg.service_name.as_deref(), Some("api"));
    assert_eq!(cfg.logging.default_level().unwrap(), Level::Info);
    assert_eq!(cfg.logging.rate_limit.mode, RateLimitMode::Queue);
    assert_eq!(cfg.logging.rate_limit.max_queue_size, 1000);
    assert!(cfg.logging.das_emoji_prefix_enabled);
    assert!(cfg.validate().is_ok());
}

#[test]
fn unknown_fields_are_rejected() {
    let raw = r#"{ "logging": { "default_levl": "INFO" } }"#;
    assert!(serde_json::from_str::<TelemetryConfig>(raw).is_err());
}

#[test]
fn builder_helpers_compose() {
    let cfg = TelemetryConfig::new(
        LoggingConfig::default()
            .with_default_level("DEBUG")
            .with_module_level("db", "ERROR")
            .with_formatter("json"),
    )
    .with_service_name("billing");

    assert_eq!(cfg.service_name.as_deref(), Some("billing"));
    assert_eq!(cfg.logging.formatter().unwrap(), FormatterKind::Json);
    assert_eq!(
        cfg.logging.module_levels().unwrap(),
        vec![("db".to_string(), Level::Error)]
    );
    assert!(cfg.validate().is_ok());
}
