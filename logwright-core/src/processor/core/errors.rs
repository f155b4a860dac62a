use std::fmt::{Display, Formatter};

/// A fault raised by one stage of the processor chain.
///
/// Stage faults never abort the chain; the chain skips the stage and keeps
/// going with whatever the event looked like at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorError {
    /// Name of the stage that failed
    pub stage: &'static str,
    /// A descriptive message explaining what went wrong
    pub message: String,
    /// Whether the stage panicked rather than returning an error
    pub panicked: bool,
}

impl ProcessorError {
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            panicked: false,
        }
    }

    pub(crate) fn panicked(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            panicked: true,
        }
    }
}

impl Display for ProcessorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let panicked = if self.panicked { "(panicked) " } else { "" };
        write!(f, "stage '{}' {}{}", self.stage, panicked, self.message)
    }
}

impl std::error::Error for ProcessorError {}
