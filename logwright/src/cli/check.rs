use anyhow::Result;
use logwright_core::{ConfigError, LoggingContext, TelemetryConfig};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(path: Option<&Path>, plain: bool) -> Result<()> {
    let cfg = match super::load_config(path) {
        Ok(cfg) => cfg,
        Err(err) => match err.downcast::<ConfigError>() {
            Ok(err) => {
                print_config_error(&err, plain);
                std::process::exit(1);
            }
            Err(err) => return Err(err),
        },
    };

    match LoggingContext::validate(&cfg) {
        Ok(()) => {
            print_summary(&cfg, plain);
            Ok(())
        }
        Err(err) => {
            print_config_error(&err, plain);
            std::process::exit(1);
        }
    }
}

fn print_summary(cfg: &TelemetryConfig, plain: bool) {
    let logging = &cfg.logging;
    let rl = &logging.rate_limit;

    let mut lines = vec![
        "Config is valid".to_string(),
        format!(
            "service {}",
            cfg.service_name.as_deref().unwrap_or("(unnamed)")
        ),
        format!("default level {}", logging.default_level.to_ascii_uppercase()),
        format!("formatter {}", logging.console_formatter),
        format!("{} module level overrides", logging.module_levels.len()),
    ];
    if rl.is_active() {
        lines.push(format!(
            "rate limiting on ({:?} mode, {} per-logger limits)",
            rl.mode,
            rl.per_logger.len()
        ));
    } else {
        lines.push("rate limiting off".to_string());
    }
    if logging.sanitization.enabled {
        lines.push(format!(
            "sanitization on ({} key patterns)",
            logging.sanitization.sensitive_keys.len()
        ));
    } else {
        lines.push("sanitization off".to_string());
    }

    for line in lines {
        if plain {
            println!("✔ {line}");
        } else {
            println!("{} {line}", "✔".green());
        }
    }
}

fn print_config_error(err: &ConfigError, plain: bool) {
    if plain {
        eprintln!("{err}");
    } else {
        eprintln!();
        eprintln!("{} {}", "✖".red().bold(), err.bold());
    }
    if let Some(hint) = config_error_hint(err) {
        eprintln!();
        eprintln!("{hint}");
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        //---------------------------------------------------------------------
        // Level errors
        //---------------------------------------------------------------------
        ConfigError::InvalidDefaultLevel { .. } | ConfigError::InvalidModuleLevel { .. } => Some(
            "Levels are one of TRACE, DEBUG, INFO, WARNING, ERROR or CRITICAL.\n\
             \n\
             Example:\n\
             \n\
             LOGWRIGHT_LOG_LEVEL=INFO\n\
             LOGWRIGHT_LOG_MODULE_LEVELS=database:WARNING,auth.oauth:DEBUG",
        ),

        //---------------------------------------------------------------------
        // Formatter errors
        //---------------------------------------------------------------------
        ConfigError::InvalidFormatter { .. } => Some(
            "The console formatter must be `json` or `key_value`.",
        ),

        //---------------------------------------------------------------------
        // Rate limit errors
        //---------------------------------------------------------------------
        ConfigError::InvalidRateLimit { .. } => Some(
            "Rates are events per second and must be greater than zero.\n\
             Capacities must be at least 1 and queue sizes must be non-zero.\n\
             \n\
             Example:\n\
             \n\
             LOGWRIGHT_LOG_RATE_LIMIT_PER_LOGGER=database:10:20,api:50:100",
        ),

        //---------------------------------------------------------------------
        // Sanitization errors
        //---------------------------------------------------------------------
        ConfigError::InvalidKeyPattern { .. } => Some(
            "Sensitive keys are glob patterns matched case-insensitively.\n\
             \n\
             Example: `password`, `*_token`, `api_key*`",
        ),

        ConfigError::InvalidEnvVar { .. } | ConfigError::SetupPanicked { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_errors_carry_a_hint() {
        let err = ConfigError::InvalidDefaultLevel {
            value: "LOUD".into(),
        };
        assert!(config_error_hint(&err).is_some_and(|h| h.contains("WARNING")));
    }

    #[test]
    fn env_errors_have_no_hint() {
        let err = ConfigError::env("LOGWRIGHT_LOG_RATE_LIMIT_ENABLED", "maybe", "not a boolean");
        assert!(config_error_hint(&err).is_none());
    }
}
