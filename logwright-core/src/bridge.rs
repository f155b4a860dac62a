//! Forwards `tracing` events into a [`LoggingContext`].
//!
//! The target becomes the logger name (`a::b` turns into `a.b`) and the
//! `message` field becomes the event message. Events from this crate itself
//! are skipped so internal diagnostics cannot loop back into the pipeline.

use crate::event::{FieldValue, Fields};
use crate::level::Level;
use crate::logger::LoggingContext;
use std::fmt::Debug;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

const OWN_TARGET_PREFIX: &str = "logwright";

pub struct LogwrightLayer {
    context: LoggingContext,
}

impl LogwrightLayer {
    pub fn new(context: LoggingContext) -> Self {
        Self { context }
    }
}

impl<S: Subscriber> Layer<S> for LogwrightLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(OWN_TARGET_PREFIX) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let logger = self.context.get_logger(meta.target().replace("::", "."));
        let message = visitor.message.unwrap_or_default();
        logger.emit(Level::from(meta.level()), &message, visitor.fields);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl FieldVisitor {
    fn record(&mut self, field: &Field, value: FieldValue) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.into());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, value.to_string().into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.record(field, format!("{value:?}").into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, TelemetryConfig};
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn forwards_tracing_events_with_fields() {
        // Arrange
        let sink = MemorySink::new();
        let logging = LoggingConfig {
            omit_timestamp: true,
            logger_name_emoji_prefix_enabled: false,
            ..LoggingConfig::default()
                .with_default_level("DEBUG")
                .with_formatter("json")
        };
        let context = LoggingContext::builder()
            .with_sink(sink.clone())
            .with_default_config(TelemetryConfig::new(logging))
            .build();
        let subscriber = tracing_subscriber::registry().with(LogwrightLayer::new(context));

        // Act
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "billing::invoices", invoice = 42, paid = true, "invoice settled");
            tracing::trace!(target: "billing::invoices", "too quiet");
        });

        // Assert
        assert_eq!(
            sink.lines(),
            vec![r#"{"level":"info","logger":"billing.invoices","event":"invoice settled","invoice":42,"paid":true}"#]
        );
    }
}
