mod context;
pub mod tracing;

pub use context::{TestContext, json_config};
pub use tracing::{CapturedEvent, init_test_tracing};
