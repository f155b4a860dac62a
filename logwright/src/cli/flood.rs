use anyhow::Result;
use logwright_core::sink::{FileRotation, RollingFileSink};
use logwright_core::{ConsoleSink, LoggingContext, fields};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Drive the pipeline as fast as possible and report what the rate limiter
/// let through. Useful for tuning `LOGWRIGHT_LOG_RATE_LIMIT_*`.
pub fn run(
    logger: &str,
    duration_secs: u64,
    config: Option<&Path>,
    log_dir: Option<&Path>,
) -> Result<()> {
    let cfg = super::load_config(config)?;
    LoggingContext::validate(&cfg)?;

    // With a log directory, events go to hourly files instead of stderr.
    let builder = match log_dir {
        Some(dir) => LoggingContext::builder().with_sink(RollingFileSink::new(
            dir,
            "flood.log",
            FileRotation::Hourly,
            Some(24),
        )?),
        None => LoggingContext::builder().with_sink(ConsoleSink::stderr()),
    };
    let context = builder.with_default_config(cfg).build();
    let log = context.get_logger(logger);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    tracing::info!(event = "flood_started", logger, duration_secs);

    let deadline = deadline_after(duration_secs);
    let mut emitted: u64 = 0;
    while running.load(Ordering::SeqCst) && deadline.is_none_or(|d| Instant::now() < d) {
        emitted += 1;
        log.info_with("flood", fields! { "seq" => emitted });
    }

    context.flush();
    let summary = json!({
        "emitted": emitted,
        "dropped": context.dropped_count(),
        "rate_limiter": context.rate_limit_stats(),
        "queue": context.queue_stats(),
        "degraded_sinks": context.degraded_sinks(),
    });
    context.shutdown();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// `None` when the duration overflows the clock; the run then lasts until Ctrl-C.
fn deadline_after(duration_secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(duration_secs))
}
