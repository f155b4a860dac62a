use crate::ratelimit::RateLimitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Levels
    #[error("invalid default level '{value}'")]
    InvalidDefaultLevel { value: String },

    #[error("invalid level '{value}' for module '{module}'")]
    InvalidModuleLevel { module: String, value: String },

    // Formatter
    #[error("unknown console formatter '{value}' (expected 'json' or 'key_value')")]
    InvalidFormatter { value: String },

    // Rate limiting
    #[error("invalid rate limit for {scope}: {source}")]
    InvalidRateLimit {
        scope: String,
        #[source]
        source: RateLimitError,
    },

    // Sanitization
    #[error("invalid sensitive key pattern '{pattern}': {source}")]
    InvalidKeyPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // Environment
    #[error("environment variable {name}={value:?} is invalid: {reason}")]
    InvalidEnvVar {
        name: String,
        value: String,
        reason: String,
    },

    // Construction
    #[error("logging setup panicked: {message}")]
    SetupPanicked { message: String },
}

impl ConfigError {
    pub fn env(name: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn rate_limit(scope: impl Into<String>, source: RateLimitError) -> Self {
        Self::InvalidRateLimit {
            scope: scope.into(),
            source,
        }
    }
}
