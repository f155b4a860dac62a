//! The process-wide default context and its free-function shortcuts.

use crate::config::TelemetryConfig;
use crate::logger::{LoggerHandle, LoggingContext};
use crate::setup::SetupState;
use once_cell::sync::Lazy;

static DEFAULT_CONTEXT: Lazy<LoggingContext> = Lazy::new(LoggingContext::new);

pub fn default_context() -> &'static LoggingContext {
    &DEFAULT_CONTEXT
}

/// Set up the default context now instead of on first use.
pub fn initialize(config: Option<&TelemetryConfig>) -> SetupState {
    DEFAULT_CONTEXT.initialize(config)
}

pub fn get_logger(name: impl Into<String>) -> LoggerHandle {
    DEFAULT_CONTEXT.get_logger(name)
}

/// Drop the default context's setup so the next use rebuilds it.
pub fn reset_for_testing() {
    DEFAULT_CONTEXT.reset();
}
