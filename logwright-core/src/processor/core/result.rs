use super::errors::ProcessorError;

#[derive(Debug)]
pub enum ProcessorResult {
    /// Continue to the next stage
    Continue,

    /// Discard the event; no later stage runs and nothing is rendered
    Drop,

    /// Stage failed; the chain reports it and moves on to the next stage
    Error(ProcessorError),
}
