use crate::event::LogEvent;
use crate::processor::core::Processor;
use crate::processor::core::result::ProcessorResult;
use std::cell::RefCell;
use std::sync::Arc;
use uuid::Uuid;

pub const TRACE_ID_KEY: &str = "trace_id";
pub const SPAN_ID_KEY: &str = "span_id";

/// Identifiers of the span active on the emitting thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

impl SpanContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
        }
    }

    /// Fresh random ids: 32 hex chars for the trace, 16 for the span.
    pub fn generate() -> Self {
        let trace_id = Uuid::new_v4().simple().to_string();
        let span_id = Uuid::new_v4().simple().to_string()[..16].to_string();
        Self { trace_id, span_id }
    }

    /// A child span in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Self::generate().span_id,
        }
    }
}

/// Source of the ambient span context.
pub trait SpanContextProvider: Send + Sync {
    fn current_span_context(&self) -> Option<SpanContext>;
}

/// Never reports a span.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpanContext;

impl SpanContextProvider for NoSpanContext {
    fn current_span_context(&self) -> Option<SpanContext> {
        None
    }
}

thread_local! {
    static SPAN_STACK: RefCell<Vec<SpanContext>> = const { RefCell::new(Vec::new()) };
}

/// Reads spans entered on the current thread with [`enter_span`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadLocalSpanContext;

impl SpanContextProvider for ThreadLocalSpanContext {
    fn current_span_context(&self) -> Option<SpanContext> {
        SPAN_STACK.with(|stack| stack.borrow().last().cloned())
    }
}

/// Make the given ids the current span on this thread until the guard drops.
pub fn enter_span(trace_id: impl Into<String>, span_id: impl Into<String>) -> SpanGuard {
    enter_span_context(SpanContext::new(trace_id, span_id))
}

pub fn enter_span_context(ctx: SpanContext) -> SpanGuard {
    SPAN_STACK.with(|stack| stack.borrow_mut().push(ctx));
    SpanGuard { _not_send: std::marker::PhantomData }
}

/// Pops the span pushed by [`enter_span`].
#[must_use = "the span is exited as soon as the guard is dropped"]
pub struct SpanGuard {
    // Must be dropped on the thread that entered the span.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        SPAN_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Adds `trace_id` and `span_id` when a span is active. The span captured on
/// the event wins over the provider, which only sees the thread running the
/// chain. Ids the caller supplied explicitly are left alone.
pub struct TraceContextProcessor {
    provider: Arc<dyn SpanContextProvider>,
}

impl TraceContextProcessor {
    pub fn new(provider: Arc<dyn SpanContextProvider>) -> Self {
        Self { provider }
    }
}

impl Processor for TraceContextProcessor {
    fn name(&self) -> &'static str {
        "trace_context"
    }

    fn process(&self, event: &mut LogEvent) -> ProcessorResult {
        let captured = event.span.take();
        let Some(ctx) = captured.or_else(|| self.provider.current_span_context()) else {
            return ProcessorResult::Continue;
        };
        if !event.fields.contains_key(TRACE_ID_KEY) {
            event.fields.insert(TRACE_ID_KEY, ctx.trace_id);
        }
        if !event.fields.contains_key(SPAN_ID_KEY) {
            event.fields.insert(SPAN_ID_KEY, ctx.span_id);
        }
        ProcessorResult::Continue
    }
}
