pub mod builtin;
pub mod core;
pub mod render;

pub use self::core::builder::{PipelineBuilder, build};
pub use self::core::errors::ProcessorError;
pub use self::core::pipeline::{ChainOutput, ProcessorChain};
pub use self::core::result::ProcessorResult;
pub use self::core::{Processor, is_internal_key};

#[cfg(test)]
mod tests;
