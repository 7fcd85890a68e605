use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::disposable::Disposable;
use crate::error::StreamError;
use crate::maybe::Maybe;

use super::listeners::Listeners;
use super::subscription::Subscription;
use super::Stream;

/// Initial cache contents for a [`ConsciousStream`].
#[derive(Debug, Clone)]
pub struct StartingValues<T> {
    /// Value reported before the stream emits anything.
    pub value: Maybe<T>,
    /// Error reported before the stream errors.
    pub error: Maybe<StreamError>,
}

impl<T> Default for StartingValues<T> {
    fn default() -> Self {
        Self {
            value: Maybe::Absent,
            error: Maybe::Absent,
        }
    }
}

struct Memory<T> {
    last_value: Maybe<T>,
    last_error: Maybe<StreamError>,
}

/// A stream wrapper that remembers the last value and error it observed.
///
/// Subscribes to the wrapped stream on construction, which activates it.
/// Clones share the same cache and subscription.
pub struct ConsciousStream<T> {
    stream: Stream<T>,
    memory: Rc<RefCell<Memory<T>>>,
    subscription: Subscription,
}

impl<T: Clone + 'static> ConsciousStream<T> {
    /// Wraps `stream` with an empty cache.
    #[must_use]
    pub fn new(stream: Stream<T>) -> Self {
        Self::with_starting(stream, StartingValues::default())
    }

    /// Wraps `stream`, seeding the cache from `starting`.
    #[must_use]
    pub fn with_starting(stream: Stream<T>, starting: StartingValues<T>) -> Self {
        let memory = Rc::new(RefCell::new(Memory {
            last_value: starting.value,
            last_error: starting.error,
        }));

        let on_value = Rc::clone(&memory);
        let on_error = Rc::clone(&memory);
        let subscription = stream.subscribe(
            Listeners::new()
                .on_next(move |value: &T| {
                    on_value.borrow_mut().last_value = Maybe::Present(value.clone());
                })
                .on_error(move |error: &StreamError| {
                    on_error.borrow_mut().last_error = Maybe::Present(error.clone());
                }),
        );

        Self {
            stream,
            memory,
            subscription,
        }
    }

    /// The most recent value, or the seeded one.
    #[must_use]
    pub fn last_value(&self) -> Maybe<T> {
        self.memory.borrow().last_value.clone()
    }

    /// The most recent error, or the seeded one.
    #[must_use]
    pub fn last_error(&self) -> Maybe<StreamError> {
        self.memory.borrow().last_error.clone()
    }

    /// The wrapped stream.
    #[must_use]
    pub fn stream(&self) -> &Stream<T> {
        &self.stream
    }

    /// The internal cache subscription.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Reports whether the wrapped stream is still undisposed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stream.is_active()
    }

    /// Stops caching. The wrapped stream keeps running.
    pub fn dispose(&self) {
        self.subscription.dispose();
    }

    /// Stops caching and disposes the wrapped stream.
    pub fn dispose_self_and_stream(&self) {
        self.subscription.dispose();
        self.stream.dispose();
    }
}

impl<T: Clone + 'static> Disposable for ConsciousStream<T> {
    fn dispose(&self) {
        ConsciousStream::dispose(self);
    }
}

impl<T> Clone for ConsciousStream<T> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
            memory: Rc::clone(&self.memory),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConsciousStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let memory = self.memory.borrow();
        f.debug_struct("ConsciousStream")
            .field("last_value", &memory.last_value)
            .field("last_error", &memory.last_error)
            .field("stream", &self.stream)
            .finish()
    }
}
