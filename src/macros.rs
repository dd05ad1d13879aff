//! Internal logging macros.
//!
//! These forward to `tracing` when the `tracing` feature is enabled and expand
//! to nothing otherwise, so hot paths pay nothing in default builds.

macro_rules! trace_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($arg)*);
        }
    }};
}

macro_rules! debug_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        {
            tracing::debug!($($arg)*);
        }
    }};
}

pub(crate) use debug_event;
pub(crate) use trace_event;
