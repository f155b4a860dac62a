use integration_tests::harness::{TestContext, json_config};
use logwright_core::TelemetryConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

//-----------------------------------------------------------------------------
// Helpers
//-----------------------------------------------------------------------------

fn limited_config() -> TelemetryConfig {
    let mut cfg = json_config();
    cfg.logging = cfg.logging.with_module_level("noisy", "ERROR");
    let rl = &mut cfg.logging.rate_limit;
    rl.enabled = true;
    rl.global_rate = Some(0.01);
    rl.global_capacity = Some(2.0);
    cfg
}

#[test]
fn filtered_events_never_spend_tokens() {
    // Arrange
    let ctx = TestContext::new(limited_config());
    let noisy = ctx.context.get_logger("noisy.worker");
    let app = ctx.context.get_logger("app");

    // Act
    for _ in 0..50 {
        noisy.info("chatter");
    }
    app.info("first");
    app.info("second");

    // Assert
    let stats = ctx.context.rate_limit_stats().unwrap();
    assert_eq!(stats.total_allowed, 2);
    assert_eq!(stats.total_denied, 0);
    assert_eq!(ctx.context.dropped_count(), 0);
    assert_eq!(ctx.output.len(), 2);
}

#[test]
fn exhausted_bucket_drops_and_warns_once() {
    // Arrange
    let ctx = TestContext::new(limited_config());
    let app = ctx.context.get_logger("app");

    // Act
    for _ in 0..5 {
        app.info("busy");
    }

    // Assert
    assert_eq!(ctx.context.dropped_count(), 3);
    let lines = ctx.json_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[2],
        json!({
            "level": "warning",
            "logger": "logwright.ratelimit",
            "event": "Rate limit active, events suppressed",
            "suppressed_count": 1,
            "rate_limited_logger": "app",
        })
    );
}

#[test]
fn module_levels_match_whole_segments() {
    // Arrange
    let ctx = TestContext::new(limited_config());

    // Act
    ctx.context.get_logger("noisy").warning("dropped by module level");
    ctx.context.get_logger("noisybird").warning("kept");

    // Assert
    let loggers: Vec<_> = ctx
        .json_lines()
        .iter()
        .map(|l| l["logger"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(loggers, vec!["noisybird"]);
}
