use crate::config::{ConfigError, LoggingConfig, TelemetryConfig};
use crate::emergency::EmergencyWriter;
use crate::event::LogEvent;
use crate::fields;
use crate::level::Level;
use crate::logger::LoggingContext;
use crate::processor::builtin::enter_span;
use crate::processor::{Processor, ProcessorResult};
use crate::setup::SetupState;
use crate::sink::MemorySink;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

//-----------------------------------------------------------------------------
// Test helpers
//-----------------------------------------------------------------------------

fn json_logging(level: &str) -> LoggingConfig {
    LoggingConfig {
        omit_timestamp: true,
        logger_name_emoji_prefix_enabled: false,
        ..LoggingConfig::default()
            .with_default_level(level)
            .with_formatter("json")
    }
}

fn context_with(logging: LoggingConfig) -> (LoggingContext, MemorySink) {
    let sink = MemorySink::new();
    let ctx = LoggingContext::builder()
        .with_sink(sink.clone())
        .with_emergency_writer(EmergencyWriter::to_sink(Arc::new(MemorySink::new())))
        .with_default_config(TelemetryConfig::new(logging))
        .build();
    (ctx, sink)
}

fn parsed(sink: &MemorySink) -> Vec<Value> {
    sink.lines()
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[derive(Default)]
struct StageCounter(AtomicUsize);

impl Processor for StageCounter {
    fn name(&self) -> &'static str {
        "stage_counter"
    }

    fn process(&self, _event: &mut LogEvent) -> ProcessorResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        ProcessorResult::Continue
    }
}

//-----------------------------------------------------------------------------
// Tests
//-----------------------------------------------------------------------------

#[test]
fn first_emission_builds_setup_lazily() {
    let (ctx, sink) = context_with(json_logging("INFO"));
    assert_eq!(ctx.state(), SetupState::Uninitialized);

    ctx.get_logger("app").info("started");

    assert_eq!(ctx.state(), SetupState::Ready);
    assert_eq!(ctx.construction_count(), 1);
    assert_eq!(parsed(&sink)[0]["event"], json!("started"));
}

#[test]
fn default_level_warning_drops_info() {
    let (ctx, sink) = context_with(json_logging("WARNING"));
    let log = ctx.get_logger("app");

    log.info("quiet");
    log.warning("loud");

    let lines = parsed(&sink);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], json!("warning"));
}

#[test]
fn module_override_filters_before_pipeline() {
    // Arrange
    let counter = Arc::new(StageCounter::default());
    let sink = MemorySink::new();
    let logging = json_logging("INFO").with_module_level("database", "ERROR");
    let ctx = LoggingContext::builder()
        .with_sink(sink.clone())
        .with_processor(Arc::clone(&counter) as Arc<dyn Processor>)
        .with_default_config(TelemetryConfig::new(logging))
        .build();

    // Act
    ctx.get_logger("database.connection").info("suppressed");
    ctx.get_logger("web.handler").info("kept");

    // Assert
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    let lines = parsed(&sink);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["logger"], json!("web.handler"));
}

#[test]
fn bound_fields_merge_under_call_site_fields() {
    let (ctx, sink) = context_with(json_logging("INFO"));
    let log = ctx
        .get_logger("api")
        .bind(fields! { "request_id" => "r-1", "user" => "bound" });

    log.info_with("handled", fields! { "user" => "call-site", "status_code" => 200 });
    log.unbind(&["request_id"]).info("after unbind");

    let lines = parsed(&sink);
    assert_eq!(lines[0]["request_id"], json!("r-1"));
    assert_eq!(lines[0]["user"], json!("call-site"));
    assert_eq!(lines[0]["status_code"], json!(200));
    assert!(lines[1].get("request_id").is_none());
    assert_eq!(lines[1]["user"], json!("bound"));
}

#[test]
fn exception_attaches_type_and_chain() {
    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("could not load profile")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    let (ctx, sink) = context_with(json_logging("INFO"));
    let err = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "profile.json missing"));

    ctx.get_logger("profiles")
        .exception("load failed", &err, fields! { "user_id" => 7 });

    let line = &parsed(&sink)[0];
    assert_eq!(line["level"], json!("error"));
    assert_eq!(line["exc_type"], json!("Outer"));
    assert_eq!(line["exception"], json!("could not load profile: profile.json missing"));
    assert_eq!(line["user_id"], json!(7));
}

#[test]
fn backtrace_is_attached_only_when_captured() {
    let captured = crate::logger::backtrace_field(&std::backtrace::Backtrace::force_capture());
    let disabled = crate::logger::backtrace_field(&std::backtrace::Backtrace::disabled());

    assert!(captured.is_some_and(|trace| trace.as_str().is_some_and(|s| !s.is_empty())));
    assert_eq!(disabled, None);
}

#[test]
fn log_result_passes_value_through() {
    let (ctx, sink) = context_with(json_logging("INFO"));
    let log = ctx.get_logger("app");

    let ok: Result<u8, std::fmt::Error> = log.log_result("never logged", Ok(3));
    let err: Result<u8, std::fmt::Error> = log.log_result("formatting", Err(std::fmt::Error));

    assert_eq!(ok, Ok(3));
    assert!(err.is_err());
    assert_eq!(sink.len(), 1);
}

#[test]
fn span_context_is_attached() {
    let (ctx, sink) = context_with(json_logging("INFO"));

    {
        let _span = enter_span("4bf92f3577b34da6a3ce929d0e0e4736", "00f067aa0ba902b7");
        ctx.get_logger("app").info("inside span");
    }
    ctx.get_logger("app").info("outside span");

    let lines = parsed(&sink);
    assert_eq!(lines[0]["trace_id"], json!("4bf92f3577b34da6a3ce929d0e0e4736"));
    assert_eq!(lines[0]["span_id"], json!("00f067aa0ba902b7"));
    assert!(lines[1].get("trace_id").is_none());
}

#[test]
fn bad_config_falls_back_to_emergency_output() {
    // Arrange
    let sink = MemorySink::new();
    let emergency = MemorySink::new();
    let ctx = LoggingContext::builder()
        .with_sink(sink.clone())
        .with_emergency_writer(EmergencyWriter::to_sink(Arc::new(emergency.clone())))
        .with_default_config(TelemetryConfig::new(
            LoggingConfig::default().with_default_level("LOUD"),
        ))
        .build();
    let log = ctx.get_logger("app");

    // Act
    log.error_with("still visible", fields! { "k" => 1 });
    log.error("again");

    // Assert
    assert_eq!(ctx.state(), SetupState::Error);
    assert_eq!(ctx.construction_count(), 1);
    assert!(matches!(
        ctx.last_error().as_deref(),
        Some(ConfigError::InvalidDefaultLevel { .. })
    ));
    assert!(sink.is_empty());

    let lines = emergency.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("logging setup failed"));
    assert_eq!(lines[1], "[logwright] ERROR app: still visible k=1");
}

#[test]
fn explicit_initialize_wins_over_defaults_and_is_idempotent() {
    let (ctx, sink) = context_with(json_logging("ERROR"));

    let state = ctx.initialize(Some(&TelemetryConfig::new(json_logging("DEBUG"))));
    ctx.initialize(Some(&TelemetryConfig::new(json_logging("CRITICAL"))));
    ctx.get_logger("app").debug("visible");

    assert_eq!(state, SetupState::Ready);
    assert_eq!(ctx.construction_count(), 1);
    assert_eq!(sink.len(), 1);
}

#[test]
fn reset_rebuilds_exactly_once_on_next_use() {
    let (ctx, _sink) = context_with(json_logging("INFO"));
    let log = ctx.get_logger("app");
    log.info("one");

    ctx.reset();
    assert_eq!(ctx.state(), SetupState::Uninitialized);

    log.info("two");
    log.info("three");
    assert_eq!(ctx.construction_count(), 2);
}

#[test]
fn reinitialize_swaps_config() {
    let (ctx, sink) = context_with(json_logging("INFO"));
    let log = ctx.get_logger("app");
    log.debug("hidden");

    ctx.reinitialize(&TelemetryConfig::new(json_logging("DEBUG")));
    log.debug("shown");

    assert_eq!(sink.len(), 1);
    assert_eq!(ctx.construction_count(), 2);
}

#[test]
fn enabled_reflects_effective_level() {
    let (ctx, _sink) = context_with(json_logging("INFO").with_module_level("auth", "DEBUG"));

    assert!(ctx.get_logger("auth.session").enabled(Level::Debug));
    assert!(!ctx.get_logger("billing").enabled(Level::Debug));
}
