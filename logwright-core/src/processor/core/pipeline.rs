use super::errors::ProcessorError;
use super::result::ProcessorResult;
use super::Processor;
use crate::event::LogEvent;
use crate::processor::render::TerminalFormatter;
use crate::sync::panic_message;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// What came out of one pass through the chain.
#[derive(Debug, Default)]
pub struct ChainOutput {
    /// The rendered line, or `None` if a stage dropped the event.
    pub rendered: Option<String>,
    /// Faults raised along the way, in stage order.
    pub faults: Vec<ProcessorError>,
}

/// The ordered list of stages plus the terminal formatter.
///
/// Built once per setup and shared read-only by every emitting thread.
#[derive(Clone)]
pub struct ProcessorChain {
    stages: Vec<Arc<dyn Processor>>,
    formatter: TerminalFormatter,
}

impl ProcessorChain {
    pub fn new(stages: Vec<Arc<dyn Processor>>, formatter: TerminalFormatter) -> Self {
        Self { stages, formatter }
    }

    /// Stage names in execution order, ending with the formatter's sub-stages.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .map(|s| s.name())
            .chain(self.formatter.stage_names())
            .collect()
    }

    pub fn formatter(&self) -> &TerminalFormatter {
        &self.formatter
    }

    /// Run every stage, then render.
    ///
    /// A stage that errors or panics is skipped and the event continues with
    /// whatever it looked like when the stage gave up. Only an explicit
    /// [`ProcessorResult::Drop`] stops the chain.
    pub fn run(&self, mut event: LogEvent) -> ChainOutput {
        let mut faults = Vec::new();

        for stage in &self.stages {
            let outcome = catch_unwind(AssertUnwindSafe(|| stage.process(&mut event)));
            match outcome {
                Ok(ProcessorResult::Continue) => continue,
                Ok(ProcessorResult::Drop) => {
                    return ChainOutput {
                        rendered: None,
                        faults,
                    };
                }
                Ok(ProcessorResult::Error(err)) => faults.push(err),
                Err(payload) => faults.push(ProcessorError::panicked(
                    stage.name(),
                    panic_message(payload.as_ref()),
                )),
            }
        }

        let rendered = match catch_unwind(AssertUnwindSafe(|| self.formatter.format(&event))) {
            Ok(Ok(line)) => line,
            Ok(Err(err)) => {
                faults.push(err);
                self.formatter.fallback(&event)
            }
            Err(payload) => {
                faults.push(ProcessorError::panicked(
                    self.formatter.renderer_name(),
                    panic_message(payload.as_ref()),
                ));
                self.formatter.fallback(&event)
            }
        };

        ChainOutput {
            rendered: Some(rendered),
            faults,
        }
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}
