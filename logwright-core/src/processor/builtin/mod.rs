pub mod emoji;
pub mod sanitize;
pub mod strip;
pub mod trace_context;

pub use emoji::{DasEmojiProcessor, LoggerNameEmojiProcessor};
pub use sanitize::SanitizeProcessor;
pub use strip::StripInternalProcessor;
pub use trace_context::{
    NoSpanContext, SpanContext, SpanContextProvider, SpanGuard, ThreadLocalSpanContext,
    TraceContextProcessor, enter_span, enter_span_context,
};
