pub mod builder;
pub mod errors;
pub mod pipeline;
pub mod result;

use self::result::ProcessorResult;
use crate::event::LogEvent;
use crate::logger::RATE_LIMIT_WARNING_KEY;
use crate::processor::builtin::emoji::{DAS_EMOJI_KEY, LOGGER_EMOJI_KEY};

/// One stage of the processor chain.
///
/// A stage sees the event after the logger's bound context has been merged
/// into its fields. It must depend only on the event and on state captured
/// when it was built, which is what lets one chain be shared by every thread
/// without locking.
pub trait Processor: Send + Sync {
    /// Stable stage name, used in fault reports.
    fn name(&self) -> &'static str;

    fn process(&self, event: &mut LogEvent) -> ProcessorResult;
}

/// Bookkeeping keys written by the built-in stages and by rate-limit summary
/// warnings. Stripped before rendering; caller fields are never touched, even
/// when they start with `_`.
pub const INTERNAL_KEYS: [&str; 3] = [LOGGER_EMOJI_KEY, DAS_EMOJI_KEY, RATE_LIMIT_WARNING_KEY];

pub fn is_internal_key(key: &str) -> bool {
    INTERNAL_KEYS.contains(&key)
}
