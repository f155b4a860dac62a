//! Structured logging with lazy, exactly-once setup.
//!
//! Events flow through a fixed chain: module-level filter, rate limiter,
//! processor stages, terminal formatter, sinks. Setup happens on first use
//! (or on an explicit [`initialize`]) and is published atomically, so the
//! hot path is one flag check and one pointer load.

pub mod bridge;
pub mod config;
pub mod emergency;
pub mod event;
pub mod filter;
pub mod global;
pub mod level;
pub mod logger;
pub mod processor;
pub mod ratelimit;
pub mod setup;
pub mod sink;

mod sync;

pub use bridge::LogwrightLayer;
pub use config::{ConfigError, LoggingConfig, TelemetryConfig};
pub use emergency::EmergencyWriter;
pub use event::{FieldValue, Fields, LogEvent};
pub use global::{default_context, get_logger, initialize, reset_for_testing};
pub use level::Level;
pub use logger::{LoggerHandle, LoggingContext, LoggingContextBuilder};
pub use processor::builtin::{SpanContext, SpanContextProvider, enter_span};
pub use setup::SetupState;
pub use sink::{ConsoleSink, MemorySink, Sink};
