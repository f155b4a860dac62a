use integration_tests::harness::{TestContext, json_config};
use logwright_core::{enter_span, fields};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn enriched_event_renders_as_one_json_line() {
    // Arrange
    let ctx = TestContext::new(json_config());
    let log = ctx
        .context
        .get_logger("payments")
        .bind(fields! { "request_id" => "r-1" });

    // Act
    {
        let _span = enter_span("0af7651916cd43dd8448eb211c80319c", "b7ad6b7169203331");
        log.info_with(
            "charge created",
            fields! {
                "amount" => 1250,
                "password" => "hunter2",
                "header" => "Bearer abc.def.ghi",
                "card" => fields! { "api_key" => "k", "last4" => "4242" },
            },
        );
    }

    // Assert
    let raw = ctx.output.lines();
    assert!(raw[0].starts_with(r#"{"level":"info","logger":"payments","event":"charge created""#));
    assert_eq!(
        ctx.json_lines(),
        vec![json!({
            "level": "info",
            "logger": "payments",
            "event": "charge created",
            "request_id": "r-1",
            "amount": 1250,
            "password": "***REDACTED***",
            "header": "Bearer ***REDACTED***",
            "card": { "api_key": "***REDACTED***", "last4": "4242" },
            "trace_id": "0af7651916cd43dd8448eb211c80319c",
            "span_id": "b7ad6b7169203331",
        })]
    );
}

#[test]
fn emoji_prefixes_land_in_the_message() {
    // Arrange
    let mut cfg = json_config();
    cfg.logging.logger_name_emoji_prefix_enabled = true;
    cfg.logging.das_emoji_prefix_enabled = true;
    let ctx = TestContext::new(cfg);

    // Act
    ctx.context.get_logger("auth.oauth").info_with(
        "token refreshed",
        fields! { "domain" => "auth", "action" => "refresh", "status" => "success" },
    );

    // Assert
    let line = &ctx.json_lines()[0];
    let event = line["event"].as_str().unwrap();
    assert!(event.starts_with("🔐 ["), "unexpected message {event:?}");
    assert!(event.ends_with("] token refreshed"));
    assert_eq!(line["domain"], "auth");
}
