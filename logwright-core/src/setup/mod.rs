//! Lazy, exactly-once construction of the logging setup.

mod coordinator;
mod ready;

pub use coordinator::{SetupCoordinator, SetupState};
pub use ready::{DefaultConfig, Published, ReadySetup, SetupDeps};
