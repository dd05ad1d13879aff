//! Error type shared by every primitive in the crate.

use std::borrow::Cow;

use thiserror::Error;

/// Failures reported by the atomic, fence and monitor primitives.
///
/// Every variant is recoverable by the caller. Arguments are validated before
/// any state is touched, so an `Err` never leaves a primitive half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was rejected before any state mutation (negative timeout,
    /// non-integer counter input, unknown field name, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    /// The waiting thread was interrupted, either before it blocked or while
    /// it was blocked.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// A single-shot update lost its compare-and-set race.
    #[error("concurrent update failed")]
    ConcurrentUpdate,

    /// Checked counter arithmetic would leave the 64-bit range.
    #[error("counter arithmetic overflowed the 64-bit range")]
    Overflow,
}

impl Error {
    /// Builds an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns `true` for [`Error::InvalidArgument`].
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
