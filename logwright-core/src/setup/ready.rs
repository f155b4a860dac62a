use crate::config::{ConfigError, RateLimitMode, TelemetryConfig};
use crate::emergency::EmergencyWriter;
use crate::event::LogEvent;
use crate::filter::ModuleLevelTable;
use crate::processor::builtin::SpanContextProvider;
use crate::processor::{PipelineBuilder, Processor, ProcessorChain};
use crate::ratelimit::{QueueConfig, QueuedRateLimiter, RateLimiter};
use crate::sink::SinkSet;
use crate::sync::lock;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where the coordinator gets its config when none is passed explicitly.
#[derive(Debug, Clone, Default)]
pub enum DefaultConfig {
    /// Read `LOGWRIGHT_*` variables at setup time.
    #[default]
    Environment,
    Fixed(TelemetryConfig),
}

impl DefaultConfig {
    pub fn load(&self) -> Result<TelemetryConfig, ConfigError> {
        match self {
            DefaultConfig::Environment => TelemetryConfig::from_env(),
            DefaultConfig::Fixed(cfg) => Ok(cfg.clone()),
        }
    }
}

/// Collaborators that outlive any single setup.
pub struct SetupDeps {
    pub sinks: Arc<SinkSet>,
    pub span_provider: Arc<dyn SpanContextProvider>,
    pub emergency: EmergencyWriter,
    pub processors: Vec<Arc<dyn Processor>>,
    pub defaults: DefaultConfig,
}

/// Runs the chain and writes the result. Shared with the queue worker.
pub(crate) struct Delivery {
    chain: ProcessorChain,
    sinks: Arc<SinkSet>,
    emergency: EmergencyWriter,
    /// Stages whose fault has already been reported.
    reported: Mutex<HashSet<&'static str>>,
}

impl Delivery {
    pub(crate) fn deliver(&self, event: LogEvent) {
        let output = self.chain.run(event);

        for fault in &output.faults {
            if lock(&self.reported).insert(fault.stage) {
                tracing::warn!(event = "stage_fault", stage = fault.stage, panicked = fault.panicked, message = %fault.message);
                self.emergency.report(&format!("processor {fault}; further faults from this stage are not reported"));
            }
        }

        if let Some(line) = output.rendered {
            self.sinks.write_line(&line, &self.emergency);
        }
    }
}

/// Everything built from one config. Immutable once published.
pub struct ReadySetup {
    config: TelemetryConfig,
    filter: ModuleLevelTable,
    limiter: Option<RateLimiter>,
    queue: Option<QueuedRateLimiter<LogEvent>>,
    queue_timeout: Duration,
    delivery: Arc<Delivery>,
}

impl ReadySetup {
    pub(crate) fn build(config: TelemetryConfig, deps: &SetupDeps) -> Result<Self, ConfigError> {
        config.validate()?;
        let logging = &config.logging;

        let filter = ModuleLevelTable::from_config(logging)?;
        let chain = PipelineBuilder::new(logging)
            .with_span_provider(Arc::clone(&deps.span_provider))
            .with_stages(deps.processors.iter().cloned())
            .build()?;

        let delivery = Arc::new(Delivery {
            chain,
            sinks: Arc::clone(&deps.sinks),
            emergency: deps.emergency.clone(),
            reported: Mutex::new(HashSet::new()),
        });

        let rl = &logging.rate_limit;
        let (limiter, queue) = match (rl.is_active(), rl.mode) {
            (false, _) => (None, None),
            (true, RateLimitMode::Drop) => {
                let limiter = RateLimiter::from_config(rl, true)
                    .map_err(|e| ConfigError::rate_limit("global", e))?;
                (Some(limiter), None)
            }
            (true, RateLimitMode::Queue) => {
                // Per-logger buckets still drop; only the global rate queues.
                let limiter = if rl.per_logger.is_empty() {
                    None
                } else {
                    Some(
                        RateLimiter::from_config(rl, false)
                            .map_err(|e| ConfigError::rate_limit("per-logger", e))?,
                    )
                };

                let queue = match rl.global_rate {
                    Some(rate) => {
                        let mut qcfg = QueueConfig::new(
                            rl.global_capacity.unwrap_or(rate),
                            rate,
                            rl.max_queue_size,
                        )
                        .with_policy(rl.overflow_policy);
                        if let Some(max) = rl.max_queue_bytes {
                            qcfg = qcfg.with_max_bytes(max);
                        }

                        let worker = Arc::clone(&delivery);
                        let queue = QueuedRateLimiter::spawn(qcfg, move |event| worker.deliver(event))
                            .map_err(|e| ConfigError::rate_limit("queue", e))?;
                        Some(queue)
                    }
                    None => None,
                };
                (limiter, queue)
            }
        };

        tracing::debug!(
            event = "setup_built",
            stages = ?delivery.chain.stage_names(),
            module_overrides = filter.overrides().count(),
            rate_limited = limiter.is_some(),
            queued = queue.is_some(),
        );

        Ok(Self {
            queue_timeout: Duration::from_millis(rl.queue_timeout_ms),
            config,
            filter,
            limiter,
            queue,
            delivery,
        })
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn filter(&self) -> &ModuleLevelTable {
        &self.filter
    }

    pub fn chain(&self) -> &ProcessorChain {
        &self.delivery.chain
    }

    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    pub fn queue(&self) -> Option<&QueuedRateLimiter<LogEvent>> {
        self.queue.as_ref()
    }

    pub fn sinks(&self) -> &SinkSet {
        &self.delivery.sinks
    }

    pub(crate) fn emergency(&self) -> &EmergencyWriter {
        &self.delivery.emergency
    }

    /// Hand an admitted event to the queue, or process it inline.
    /// Returns false if the queue rejected it for lack of room.
    pub(crate) fn dispatch(&self, event: LogEvent) -> bool {
        let Some(queue) = &self.queue else {
            self.delivery.deliver(event);
            return true;
        };

        match queue.offer(event, self.queue_timeout) {
            Ok(()) => true,
            // A reset stopped this queue while the caller still held the payload.
            Err(event) if !queue.is_running() => {
                self.delivery.deliver(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Process inline, bypassing any queue.
    pub(crate) fn deliver_now(&self, event: LogEvent) {
        self.delivery.deliver(event);
    }

    /// Stop the queue worker. Queued events are discarded.
    ///
    /// The drop-mode limiter is left running: emissions that loaded this
    /// payload before a reset still finish against it, and it goes away with
    /// the last reference.
    pub(crate) fn shutdown(&self) {
        if let Some(queue) = &self.queue {
            queue.stop();
        }
    }
}

impl std::fmt::Debug for ReadySetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadySetup")
            .field("chain", &self.delivery.chain)
            .field("filter", &self.filter)
            .field("limiter", &self.limiter)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// The payload readers see once setup has finished.
#[derive(Debug)]
pub enum Published {
    Ready(ReadySetup),
    /// Setup failed; events go to the emergency path.
    Emergency(Arc<ConfigError>),
}

impl Published {
    pub fn as_ready(&self) -> Option<&ReadySetup> {
        match self {
            Published::Ready(ready) => Some(ready),
            Published::Emergency(_) => None,
        }
    }
}
