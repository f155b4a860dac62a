//! The application-facing API: named logger handles backed by a
//! [`LoggingContext`].

mod context;

pub use context::{LoggingContext, LoggingContextBuilder, RATE_LIMIT_LOGGER, RATE_LIMIT_WARNING_KEY};

use crate::event::{FieldValue, Fields, LogEvent};
use crate::level::Level;
use crate::setup::Published;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::sync::Arc;

/// A named logger with optional bound context.
///
/// Emission never panics or returns an error. Failures show up in
/// [`LoggingContext::dropped_count`], on the emergency path and in
/// [`LoggingContext::last_error`].
#[derive(Clone)]
pub struct LoggerHandle {
    context: LoggingContext,
    name: Arc<str>,
    bound: Arc<Fields>,
}

macro_rules! level_methods {
    ($($plain:ident, $with:ident => $level:expr;)+) => {
        $(
            pub fn $plain(&self, message: &str) {
                self.emit($level, message, Fields::new());
            }

            pub fn $with(&self, message: &str, fields: Fields) {
                self.emit($level, message, fields);
            }
        )+
    };
}

impl LoggerHandle {
    pub(crate) fn new(context: LoggingContext, name: String) -> Self {
        Self {
            context,
            name: name.into(),
            bound: Arc::new(Fields::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bound(&self) -> &Fields {
        &self.bound
    }

    pub fn context(&self) -> &LoggingContext {
        &self.context
    }

    /// Whether an event at `level` would pass the module-level filter.
    pub fn enabled(&self, level: Level) -> bool {
        match &*self.context.ensure_ready() {
            Published::Ready(ready) => ready.filter().should_emit(&self.name, level),
            Published::Emergency(_) => true,
        }
    }

    pub fn emit(&self, level: Level, message: &str, fields: Fields) {
        let published = self.context.ensure_ready();
        let ready = match &*published {
            Published::Ready(ready) => ready,
            Published::Emergency(_) => {
                self.context
                    .emergency()
                    .write_event(&self.event(level, message, fields));
                return;
            }
        };

        // Filtering happens before any allocation, limiter or stage work.
        if !ready.filter().should_emit(&self.name, level) {
            return;
        }

        if let Some(limiter) = ready.limiter()
            && !limiter.admit(&self.name)
        {
            self.context.record_drop(ready, &self.name);
            return;
        }

        if !ready.dispatch(self.event(level, message, fields)) {
            self.context.record_drop(ready, &self.name);
        }
    }

    level_methods! {
        trace, trace_with => Level::Trace;
        debug, debug_with => Level::Debug;
        info, info_with => Level::Info;
        warning, warning_with => Level::Warning;
        warn, warn_with => Level::Warning;
        error, error_with => Level::Error;
        critical, critical_with => Level::Critical;
    }

    /// Log `err` at ERROR with `exc_type` and the rendered source chain.
    /// A `backtrace` of the call site is added when `RUST_BACKTRACE` or
    /// `RUST_LIB_BACKTRACE` enables capture.
    pub fn exception<E>(&self, message: &str, err: &E, fields: Fields)
    where
        E: Error + ?Sized,
    {
        let mut fields = fields;
        fields.insert("exc_type", short_type_name::<E>());
        fields.insert("exception", error_chain(err));
        if let Some(trace) = backtrace_field(&Backtrace::capture()) {
            fields.insert("backtrace", trace);
        }
        self.emit(Level::Error, message, fields);
    }

    /// Pass `result` through, logging the error case via [`exception`](Self::exception).
    pub fn log_result<T, E: Error>(&self, message: &str, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            self.exception(message, err, Fields::new());
        }
        result
    }

    /// A new handle with `fields` added to the bound context. Later values win.
    pub fn bind(&self, fields: Fields) -> LoggerHandle {
        let mut bound = (*self.bound).clone();
        bound.extend(fields);
        LoggerHandle {
            context: self.context.clone(),
            name: Arc::clone(&self.name),
            bound: Arc::new(bound),
        }
    }

    /// A new handle without the given bound keys.
    pub fn unbind(&self, keys: &[&str]) -> LoggerHandle {
        let mut bound = (*self.bound).clone();
        bound.retain(|k, _| !keys.contains(&k));
        LoggerHandle {
            context: self.context.clone(),
            name: Arc::clone(&self.name),
            bound: Arc::new(bound),
        }
    }

    fn event(&self, level: Level, message: &str, fields: Fields) -> LogEvent {
        let fields = if self.bound.is_empty() {
            fields
        } else {
            let mut merged = (*self.bound).clone();
            merged.extend(fields);
            merged
        };
        LogEvent::new(&*self.name, level, message, fields)
            .with_span(self.context.current_span())
    }
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish()
    }
}

fn short_type_name<E: ?Sized>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rsplit_once("::") {
        Some((_, last)) => last,
        None => base,
    }
}

fn backtrace_field(trace: &Backtrace) -> Option<FieldValue> {
    match trace.status() {
        BacktraceStatus::Captured => Some(FieldValue::Str(trace.to_string())),
        _ => None,
    }
}

/// `outer: cause: root cause`
fn error_chain<E: Error + ?Sized>(err: &E) -> FieldValue {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    FieldValue::Str(rendered)
}

#[cfg(test)]
mod tests;
