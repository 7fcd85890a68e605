use std::fmt;

use crate::error::StreamError;
use crate::stream::{Source, Stream};

use super::Message;

/// Write-only handle of a [`MessageStream`](super::MessageStream).
pub struct MessageStreamInput<M> {
    stream: Stream<M>,
    source: Source<M>,
}

impl<M: Message> MessageStreamInput<M> {
    pub(super) fn new(stream: Stream<M>, source: Source<M>) -> Self {
        Self { stream, source }
    }

    /// Pushes a message to every reader.
    pub fn emit(&self, message: M) {
        self.source.emit(message);
    }

    /// Pushes an error to every reader.
    pub fn emit_error(&self, error: StreamError) {
        self.source.emit_error(error);
    }

    /// Returns true until the message stream is disposed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stream.is_active()
    }
}

impl<M> Clone for MessageStreamInput<M> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
            source: self.source.clone(),
        }
    }
}

impl<M> fmt::Debug for MessageStreamInput<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStreamInput")
            .field("stream", &self.stream)
            .finish()
    }
}
