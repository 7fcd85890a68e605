//! Error types for kyrostream.
//!
//! Two kinds of failure exist in this crate:
//!
//! - [`StreamError`] is a *distributed* error: a value pushed through a stream's
//!   error channel and fanned out to listeners. It is never returned from a
//!   function call.
//! - [`MaybeError`] is a *fail-fast* error, returned only when code explicitly
//!   asks a [`Maybe`](crate::Maybe) for a value that is not there.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Errors returned when unwrapping a [`Maybe`](crate::Maybe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MaybeError {
    /// A value was requested from an absent `Maybe`.
    #[error("Empty value accessed: the Maybe holds no value")]
    EmptyValueAccessed,

    /// A value that must be present was absent at construction.
    #[error("Unexpected absence: a non-nullable value was missing")]
    UnexpectedAbsence,
}

impl MaybeError {
    /// Returns true if this error came from unwrapping an absent value.
    #[must_use]
    pub const fn is_empty_access(&self) -> bool {
        matches!(self, Self::EmptyValueAccessed)
    }

    /// Returns true if this error came from a non-nullable factory.
    #[must_use]
    pub const fn is_unexpected_absence(&self) -> bool {
        matches!(self, Self::UnexpectedAbsence)
    }
}

/// Result type alias for `Maybe` unwrapping.
pub type MaybeResult<T> = Result<T, MaybeError>;

/// Errors from the JSON envelope of [`TaggedMessage`](crate::message::TaggedMessage).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be serialized.
    #[error("Failed to encode message '{tag}': {source}")]
    Encode {
        /// Tag of the message being encoded.
        tag: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The input was not a valid `{ "tag", "payload" }` envelope.
    #[error("Failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for message encoding.
pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
#[error("{0}")]
struct MessageError(String);

/// An error distributed through a stream's error channel.
///
/// Cheap to clone: every listener receives the same underlying error.
#[derive(Clone)]
pub struct StreamError {
    inner: Rc<dyn StdError + 'static>,
}

impl StreamError {
    /// Wraps any error type.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + 'static,
    {
        Self { inner: Rc::new(error) }
    }

    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Attempts to view the wrapped error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Returns true if both handles point at the same underlying error.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.inner).cast::<()>(),
            Rc::as_ptr(&other.inner).cast::<()>(),
        )
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        &*self.inner
    }
}

impl fmt::Debug for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamError").field(&self.inner).finish()
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

impl From<MaybeError> for StreamError {
    fn from(error: MaybeError) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("sensor offline: {id}")]
    struct SensorOffline {
        id: u32,
    }

    #[test]
    fn test_maybe_error_messages() {
        let msg = format!("{}", MaybeError::EmptyValueAccessed);
        assert!(msg.contains("Empty value accessed"));

        let msg = format!("{}", MaybeError::UnexpectedAbsence);
        assert!(msg.contains("Unexpected absence"));
    }

    #[test]
    fn test_maybe_error_predicates() {
        assert!(MaybeError::EmptyValueAccessed.is_empty_access());
        assert!(!MaybeError::EmptyValueAccessed.is_unexpected_absence());
        assert!(MaybeError::UnexpectedAbsence.is_unexpected_absence());
    }

    #[test]
    fn test_stream_error_msg_display() {
        let err = StreamError::msg("connection reset");
        assert_eq!(format!("{err}"), "connection reset");
    }

    #[test]
    fn test_stream_error_downcast() {
        let err = StreamError::new(SensorOffline { id: 7 });
        assert_eq!(err.downcast_ref::<SensorOffline>(), Some(&SensorOffline { id: 7 }));
        assert!(err.downcast_ref::<MaybeError>().is_none());
        assert!(format!("{err}").contains("sensor offline: 7"));
    }

    #[test]
    fn test_stream_error_clone_shares_identity() {
        let err = StreamError::msg("boom");
        let copy = err.clone();
        assert!(err.same_as(&copy));
        assert!(!err.same_as(&StreamError::msg("boom")));
    }

    #[test]
    fn test_stream_error_from_maybe_error() {
        let err: StreamError = MaybeError::EmptyValueAccessed.into();
        assert_eq!(
            err.downcast_ref::<MaybeError>(),
            Some(&MaybeError::EmptyValueAccessed)
        );
    }
}
