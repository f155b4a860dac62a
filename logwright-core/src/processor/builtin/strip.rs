use super::emoji::{DAS_EMOJI_KEY, LOGGER_EMOJI_KEY};
use crate::event::LogEvent;
use crate::processor::core::result::ProcessorResult;
use crate::processor::core::{Processor, is_internal_key};

/// Folds the recorded emoji into the message, then removes the remaining
/// bookkeeping keys listed in [`INTERNAL_KEYS`](crate::processor::core::INTERNAL_KEYS).
///
/// The prefixed message reads `"{logger emoji} {das prefix} {message}"`,
/// with absent parts left out.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripInternalProcessor;

impl Processor for StripInternalProcessor {
    fn name(&self) -> &'static str {
        "strip_internal"
    }

    fn process(&self, event: &mut LogEvent) -> ProcessorResult {
        let logger = event.fields.remove(LOGGER_EMOJI_KEY);
        let das = event.fields.remove(DAS_EMOJI_KEY);

        let prefix: Vec<String> = [logger, das]
            .into_iter()
            .flatten()
            .map(|v| v.to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if !prefix.is_empty() {
            event.message = format!("{} {}", prefix.join(" "), event.message);
        }

        event.fields.retain(|key, _| !is_internal_key(key));
        ProcessorResult::Continue
    }
}
