//! `tracing` shims for the engine.
//!
//! Each macro is defined once and picks its expansion with `cfg` inside the
//! body, so call sites carry no feature gates. Without the `tracing` feature
//! spans become [`DisabledSpan`] and events vanish.

/// Info span around one pipeline stage; bind the result of `.entered()`.
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {{
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!($name $(, $($field)*)?);
        #[cfg(not(feature = "tracing"))]
        let span = $crate::trace::DisabledSpan;
        span
    }};
}

/// Info event named after the stage, with `key = value` fields.
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        #[cfg(feature = "tracing")]
        tracing::info!(name: $name, $($key = $value),+);
        #[cfg(not(feature = "tracing"))]
        let _ = ($($value,)+);
    }};
}

macro_rules! trace_warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)+);
    }};
}

pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// Span placeholder when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub(crate) struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    #[inline]
    pub(crate) fn entered(self) -> Self {
        self
    }
}
