use super::LoggerHandle;
use crate::config::{ConfigError, TelemetryConfig};
use crate::emergency::EmergencyWriter;
use crate::event::{Fields, LogEvent};
use crate::level::Level;
use crate::processor::Processor;
use crate::processor::builtin::{SpanContext, SpanContextProvider, ThreadLocalSpanContext};
use crate::ratelimit::{QueueStats, RateLimiterStats};
use crate::setup::{DefaultConfig, Published, ReadySetup, SetupCoordinator, SetupDeps, SetupState};
use crate::sink::{ConsoleSink, Sink, SinkSet};
use crate::sync::lock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Logger name used for rate-limit summary warnings.
pub const RATE_LIMIT_LOGGER: &str = "logwright.ratelimit";

/// Marks a summary warning. Stripped before rendering.
pub const RATE_LIMIT_WARNING_KEY: &str = "_rate_limit_warning";

#[derive(Default)]
struct LimitWarning {
    suppressed: AtomicU64,
    last: Mutex<Option<Instant>>,
}

struct ContextInner {
    coordinator: SetupCoordinator,
    dropped: AtomicU64,
    warning: LimitWarning,
}

/// One independent logging runtime: its sinks, its lazily built setup and
/// its counters. Cheap to clone.
#[derive(Clone)]
pub struct LoggingContext {
    inner: Arc<ContextInner>,
}

impl LoggingContext {
    /// Console output on stderr, thread-local spans, environment defaults.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> LoggingContextBuilder {
        LoggingContextBuilder::default()
    }

    /// Build the setup now. A no-op if a setup is already published.
    pub fn initialize(&self, config: Option<&TelemetryConfig>) -> SetupState {
        self.inner.coordinator.ensure_ready(config);
        self.state()
    }

    /// Replace whatever is published with a setup built from `config`.
    pub fn reinitialize(&self, config: &TelemetryConfig) -> SetupState {
        self.inner.coordinator.reinitialize(config);
        self.state()
    }

    pub fn get_logger(&self, name: impl Into<String>) -> LoggerHandle {
        LoggerHandle::new(self.clone(), name.into())
    }

    /// Return to the uninitialised state. The next emission rebuilds.
    pub fn reset(&self) {
        self.inner.coordinator.reset();
        *lock(&self.inner.warning.last) = None;
        self.inner.warning.suppressed.store(0, Ordering::Release);
    }

    /// Flush all sinks.
    pub fn flush(&self) {
        let deps = self.inner.coordinator.deps();
        deps.sinks.flush(&deps.emergency);
    }

    /// Stop limiters, then flush and close every sink.
    pub fn shutdown(&self) {
        self.inner.coordinator.reset();
        let deps = self.inner.coordinator.deps();
        deps.sinks.close(&deps.emergency);
    }

    pub fn validate(config: &TelemetryConfig) -> Result<(), ConfigError> {
        SetupCoordinator::validate(config)
    }

    pub fn state(&self) -> SetupState {
        self.inner.coordinator.state()
    }

    pub fn last_error(&self) -> Option<Arc<ConfigError>> {
        self.inner.coordinator.last_error()
    }

    pub fn construction_count(&self) -> usize {
        self.inner.coordinator.construction_count()
    }

    /// Events rejected by a rate limiter or a full queue.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Acquire)
    }

    pub fn rate_limit_stats(&self) -> Option<RateLimiterStats> {
        let published = self.inner.coordinator.current()?;
        published.as_ready()?.limiter().map(|l| l.stats())
    }

    pub fn queue_stats(&self) -> Option<QueueStats> {
        let published = self.inner.coordinator.current()?;
        published.as_ready()?.queue().map(|q| q.stats())
    }

    pub fn degraded_sinks(&self) -> Vec<String> {
        self.inner.coordinator.deps().sinks.degraded()
    }

    pub(crate) fn ensure_ready(&self) -> Arc<Published> {
        self.inner.coordinator.ensure_ready(None)
    }

    pub(crate) fn current_span(&self) -> Option<SpanContext> {
        self.inner.coordinator.deps().span_provider.current_span_context()
    }

    pub(crate) fn emergency(&self) -> &EmergencyWriter {
        &self.inner.coordinator.deps().emergency
    }

    /// Count a rejected event and emit a summary warning if one is due.
    pub(crate) fn record_drop(&self, ready: &ReadySetup, logger_name: &str) {
        self.inner.dropped.fetch_add(1, Ordering::AcqRel);

        let rl = &ready.config().logging.rate_limit;
        if !rl.emit_warning_on_limit {
            return;
        }

        let warning = &self.inner.warning;
        warning.suppressed.fetch_add(1, Ordering::AcqRel);

        let interval = Duration::try_from_secs_f64(rl.warning_interval_secs).unwrap_or(Duration::ZERO);
        {
            let mut last = lock(&warning.last);
            if last.is_some_and(|at| at.elapsed() < interval) {
                return;
            }
            *last = Some(Instant::now());
        }

        let suppressed = warning.suppressed.swap(0, Ordering::AcqRel);
        let mut fields = Fields::new();
        fields.insert("suppressed_count", suppressed);
        fields.insert("rate_limited_logger", logger_name);
        fields.insert(RATE_LIMIT_WARNING_KEY, true);

        // Summary warnings skip the filter and the limiter that triggered them.
        ready.deliver_now(LogEvent::new(
            RATE_LIMIT_LOGGER,
            Level::Warning,
            "Rate limit active, events suppressed",
            fields,
        ));
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingContext")
            .field("coordinator", &self.inner.coordinator)
            .field("sinks", &self.inner.coordinator.deps().sinks)
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

#[derive(Default)]
pub struct LoggingContextBuilder {
    sinks: Vec<Arc<dyn Sink>>,
    span_provider: Option<Arc<dyn SpanContextProvider>>,
    emergency: Option<EmergencyWriter>,
    processors: Vec<Arc<dyn Processor>>,
    defaults: DefaultConfig,
}

impl LoggingContextBuilder {
    pub fn with_sink(self, sink: impl Sink + 'static) -> Self {
        self.with_shared_sink(Arc::new(sink))
    }

    pub fn with_shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_span_provider(mut self, provider: Arc<dyn SpanContextProvider>) -> Self {
        self.span_provider = Some(provider);
        self
    }

    pub fn with_emergency_writer(mut self, writer: EmergencyWriter) -> Self {
        self.emergency = Some(writer);
        self
    }

    /// Add a stage after the built-in enrichment stages.
    pub fn with_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Config used when setup runs without an explicit one, instead of the
    /// environment.
    pub fn with_default_config(mut self, config: TelemetryConfig) -> Self {
        self.defaults = DefaultConfig::Fixed(config);
        self
    }

    pub fn build(self) -> LoggingContext {
        let sinks = if self.sinks.is_empty() {
            vec![Arc::new(ConsoleSink::stderr()) as Arc<dyn Sink>]
        } else {
            self.sinks
        };

        let deps = SetupDeps {
            sinks: Arc::new(SinkSet::new(sinks)),
            span_provider: self
                .span_provider
                .unwrap_or_else(|| Arc::new(ThreadLocalSpanContext)),
            emergency: self.emergency.unwrap_or_default(),
            processors: self.processors,
            defaults: self.defaults,
        };

        LoggingContext {
            inner: Arc::new(ContextInner {
                coordinator: SetupCoordinator::new(deps),
                dropped: AtomicU64::new(0),
                warning: LimitWarning::default(),
            }),
        }
    }
}
