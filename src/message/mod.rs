//! Typed message routing.
//!
//! A [`MessageStream`] owns one live stream of messages and splits access to
//! it in two: a write-only [`MessageStreamInput`] and a read-only
//! [`MessageStreamOutput`] that demultiplexes messages by tag into memoized
//! per-tag [`ConsciousStream`](crate::stream::ConsciousStream)s.

mod input;
mod output;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::disposable::Disposable;
use crate::error::{CodecError, CodecResult};
use crate::stream::{Distributor, Source, Stream};

pub use input::MessageStreamInput;
pub use output::MessageStreamOutput;

/// A value routed by tag.
///
/// Enums usually implement this by returning a fixed tag per variant, which
/// makes the message type a discriminated union:
///
/// ```rust,ignore
/// #[derive(Clone)]
/// enum Counter {
///     Increment(u32),
///     Reset,
/// }
///
/// impl Message for Counter {
///     fn tag(&self) -> &str {
///         match self {
///             Counter::Increment(_) => "increment",
///             Counter::Reset => "reset",
///         }
///     }
/// }
/// ```
pub trait Message: Clone + 'static {
    /// The routing tag. Routing uses exact string equality.
    fn tag(&self) -> &str;
}

/// A generic `{ tag, payload }` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedMessage<P> {
    tag: String,
    payload: P,
}

impl<P> TaggedMessage<P> {
    /// Creates a message.
    pub fn new(tag: impl Into<String>, payload: P) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// The routing tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The payload.
    #[must_use]
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the message, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: Serialize> TaggedMessage<P> {
    /// Encodes the envelope as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the payload cannot be serialized.
    pub fn to_json(&self) -> CodecResult<String> {
        serde_json::to_string(self).map_err(|source| CodecError::Encode {
            tag: self.tag.clone(),
            source,
        })
    }
}

impl<P: DeserializeOwned> TaggedMessage<P> {
    /// Decodes an envelope from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if `json` is not a valid envelope for `P`.
    pub fn from_json(json: &str) -> CodecResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<P: Clone + 'static> Message for TaggedMessage<P> {
    fn tag(&self) -> &str {
        &self.tag
    }
}

/// One stream of messages with separate write and read handles.
pub struct MessageStream<M: Message> {
    stream: Stream<M>,
    input: MessageStreamInput<M>,
    output: MessageStreamOutput<M>,
}

impl<M: Message> MessageStream<M> {
    /// Creates a message stream over a fresh, already-live distributor.
    #[must_use]
    pub fn new() -> Self {
        let source = Source::new(Distributor::new());
        let stream = Stream::live(source.clone());
        let input = MessageStreamInput::new(stream.clone(), source);
        let output = MessageStreamOutput::new(stream.clone());
        Self {
            stream,
            input,
            output,
        }
    }

    /// The write handle.
    #[must_use]
    pub fn input(&self) -> &MessageStreamInput<M> {
        &self.input
    }

    /// The read handle.
    #[must_use]
    pub fn output(&self) -> &MessageStreamOutput<M> {
        &self.output
    }

    /// Disposes the underlying stream, completing every reader.
    pub fn dispose(&self) {
        self.stream.dispose();
    }
}

impl<M: Message> Default for MessageStream<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> Disposable for MessageStream<M> {
    fn dispose(&self) {
        MessageStream::dispose(self);
    }
}

impl<M: Message> fmt::Debug for MessageStream<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("stream", &self.stream)
            .field("output", &self.output)
            .finish()
    }
}
