use crate::config::LoggingConfig;
use crate::event::LogEvent;
use crate::fields;
use crate::level::Level;
use crate::processor::build;
use crate::processor::render::{JsonRenderer, KeyValueRenderer, Renderer};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn fixed_event() -> LogEvent {
    let mut ev = LogEvent::new(
        "auth.service",
        Level::Info,
        "User login",
        fields! { "user_id" => "user123", "attempts" => 2 },
    );
    ev.timestamp = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    ev
}

#[test]
fn json_puts_reserved_keys_first_then_fields_in_order() {
    let line = JsonRenderer
        .render(&fixed_event(), Some("2025-01-02T03:04:05.000Z"))
        .unwrap();

    assert_eq!(
        line,
        r#"{"timestamp":"2025-01-02T03:04:05.000Z","level":"info","logger":"auth.service","event":"User login","user_id":"user123","attempts":2}"#
    );
}

#[test]
fn json_renames_colliding_user_fields() {
    let ev = LogEvent::new("app", Level::Error, "boom", fields! { "level" => "custom" });

    let parsed: Value = serde_json::from_str(&JsonRenderer.render(&ev, None).unwrap()).unwrap();

    assert_eq!(parsed["level"], json!("error"));
    assert_eq!(parsed["field.level"], json!("custom"));
    assert!(parsed.get("timestamp").is_none());
}

#[test]
fn json_rename_never_duplicates_a_user_key() {
    // Arrange
    let ev = LogEvent::new(
        "app",
        Level::Info,
        "m",
        fields! { "level" => "custom", "field.level" => "mine", "field.level.1" => "also mine" },
    );

    // Act
    let line = JsonRenderer.render(&ev, None).unwrap();

    // Assert
    assert_eq!(
        line,
        r#"{"level":"info","logger":"app","event":"m","field.level.2":"custom","field.level":"mine","field.level.1":"also mine"}"#
    );
}

#[test]
fn key_value_layout() {
    let line = KeyValueRenderer::new(false)
        .render(&fixed_event(), Some("2025-01-02T03:04:05.000Z"))
        .unwrap();

    assert_eq!(
        line,
        "2025-01-02T03:04:05.000Z [info     ] User login logger=auth.service user_id=user123 attempts=2"
    );
}

#[test]
fn key_value_quotes_awkward_strings() {
    let ev = LogEvent::new(
        "app",
        Level::Warning,
        "m",
        fields! { "path" => "a b", "empty" => "", "nested" => fields! { "k" => 1 } },
    );

    let line = KeyValueRenderer::new(false).render(&ev, None).unwrap();

    assert_eq!(
        line,
        r#"[warning  ] m logger=app path="a b" empty="" nested={"k":1}"#
    );
}

#[test]
fn full_chain_round_trips_through_json() {
    // Arrange
    let cfg = LoggingConfig::default().with_formatter("json");
    let chain = build(&cfg).unwrap();
    let ev = LogEvent::new(
        "auth.service",
        Level::Info,
        "User login",
        fields! {
            "domain" => "auth",
            "action" => "login",
            "status" => "success",
            "password" => "hunter2",
        },
    );

    // Act
    let line = chain.run(ev).rendered.unwrap();
    let parsed: Value = serde_json::from_str(&line).unwrap();

    // Assert
    let obj = parsed.as_object().unwrap();
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    assert!(keys.iter().all(|k| !k.starts_with('_')));
    assert_eq!(parsed["event"], json!("🔐 [🔑][➡️][✅] User login"));
    assert_eq!(parsed["password"], json!("***REDACTED***"));
    assert_eq!(parsed["status"], json!("success"));
    assert!(parsed["timestamp"].as_str().unwrap().ends_with('Z'));
}
