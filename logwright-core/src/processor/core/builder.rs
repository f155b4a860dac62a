use super::Processor;
use super::pipeline::ProcessorChain;
use crate::config::{ConfigError, LoggingConfig};
use crate::processor::builtin::{
    DasEmojiProcessor, LoggerNameEmojiProcessor, SanitizeProcessor, SpanContextProvider,
    StripInternalProcessor, ThreadLocalSpanContext, TraceContextProcessor,
};
use crate::processor::render::TerminalFormatter;
use std::sync::Arc;

/// Assembles the fixed stage order from a [`LoggingConfig`].
///
/// Stages run as: trace context, sanitization, logger-name emoji, DAS emoji,
/// any extra stages, internal-key stripping, then the terminal formatter.
pub struct PipelineBuilder<'a> {
    config: &'a LoggingConfig,
    span_provider: Arc<dyn SpanContextProvider>,
    extra: Vec<Arc<dyn Processor>>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(config: &'a LoggingConfig) -> Self {
        Self {
            config,
            span_provider: Arc::new(ThreadLocalSpanContext),
            extra: Vec::new(),
        }
    }

    pub fn with_span_provider(mut self, provider: Arc<dyn SpanContextProvider>) -> Self {
        self.span_provider = provider;
        self
    }

    /// Extra stages run after the emoji stages, so internal keys they add are
    /// still stripped.
    pub fn with_stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Processor>>) -> Self {
        self.extra.extend(stages);
        self
    }

    pub fn build(self) -> Result<ProcessorChain, ConfigError> {
        let cfg = self.config;
        let formatter = cfg.formatter()?;

        let mut stages: Vec<Arc<dyn Processor>> =
            vec![Arc::new(TraceContextProcessor::new(self.span_provider))];

        if cfg.sanitization.enabled {
            stages.push(Arc::new(SanitizeProcessor::from_config(&cfg.sanitization)?));
        }
        if cfg.logger_name_emoji_prefix_enabled {
            stages.push(Arc::new(LoggerNameEmojiProcessor));
        }
        if cfg.das_emoji_prefix_enabled {
            stages.push(Arc::new(DasEmojiProcessor));
        }
        stages.extend(self.extra);
        stages.push(Arc::new(StripInternalProcessor));

        let terminal = TerminalFormatter::for_kind(formatter, !cfg.omit_timestamp, cfg.colors);
        Ok(ProcessorChain::new(stages, terminal))
    }
}

/// Build the chain with the thread-local span provider and no extra stages.
pub fn build(config: &LoggingConfig) -> Result<ProcessorChain, ConfigError> {
    PipelineBuilder::new(config).build()
}
