use logwright_core::LogwrightLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON subscriber for the runtime's own `tracing` events.
///
/// Filtering comes from `RUST_LOG` and defaults to `info`. The bridge layer is
/// attached as well so `tracing` events from other crates flow through the
/// default logging context; it ignores events from logwright itself.
pub fn init_diagnostics() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .with(LogwrightLayer::new(logwright_core::default_context().clone()))
        .try_init();
}
