use integration_tests::harness::{TestContext, json_config};
use logwright_core::{SetupState, fields};
use pretty_assertions::assert_eq;

#[test]
fn bad_config_falls_back_to_emergency_output() {
    // Arrange
    let mut cfg = json_config();
    cfg.logging.default_level = "LOUD".into();
    let ctx = TestContext::new(cfg);

    // Act
    ctx.context
        .get_logger("app")
        .error_with("boom", fields! { "code" => 7 });

    // Assert
    assert_eq!(ctx.context.state(), SetupState::Error);
    assert!(ctx.context.last_error().is_some());
    assert!(ctx.output.is_empty());
    assert_eq!(
        ctx.emergency.lines(),
        vec![
            "[logwright] logging setup failed, using emergency output: invalid default level 'LOUD'"
                .to_string(),
            "[logwright] ERROR app: boom code=7".to_string(),
        ]
    );
}

#[test]
fn reinitialize_recovers_from_emergency_mode() {
    // Arrange
    let mut bad = json_config();
    bad.logging.default_level = "LOUD".into();
    let ctx = TestContext::new(bad);
    ctx.context.get_logger("app").error("lost to stderr");

    // Act
    let state = ctx.context.reinitialize(&json_config());
    ctx.context.get_logger("app").info("back to normal");

    // Assert
    assert_eq!(state, SetupState::Ready);
    assert!(ctx.context.last_error().is_none());
    assert_eq!(ctx.output.len(), 1);
    assert_eq!(ctx.json_lines()[0]["event"], "back to normal");
}
