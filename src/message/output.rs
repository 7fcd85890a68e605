use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::StreamError;
use crate::maybe::Maybe;
use crate::operators::filter;
use crate::stream::{ConsciousStream, Listeners, Source, StartingValues, Stream, Subscription};

use super::TaggedMessage;

use super::Message;

struct OutputState<M> {
    stream: Stream<M>,
    last_error: RefCell<Maybe<StreamError>>,
    by_tag: RefCell<BTreeMap<String, ConsciousStream<M>>>,
    // Payload views, keyed by tag and payload type. Values are `ConsciousStream<P>`.
    payloads: RefCell<HashMap<(String, TypeId), Box<dyn Any>>>,
}

impl<M: Message> OutputState<M> {
    /// Returns the per-tag stream for `tag`, creating it on first use.
    ///
    /// A new per-tag stream starts with the output's last error and with
    /// `value` as its last value.
    fn ensure(&self, tag: &str, value: Maybe<M>) -> ConsciousStream<M> {
        if let Some(existing) = self.by_tag.borrow().get(tag) {
            return existing.clone();
        }

        let wanted = tag.to_string();
        let per_tag = self.stream.pipe(filter(move |message: &M| message.tag() == wanted));
        let starting = StartingValues {
            value,
            error: self.last_error.borrow().clone(),
        };
        let conscious = ConsciousStream::with_starting(per_tag, starting);
        debug!(tag, "per-tag stream created");

        self.by_tag
            .borrow_mut()
            .insert(tag.to_string(), conscious.clone());
        conscious
    }
}

/// Read-only handle of a [`MessageStream`](super::MessageStream).
///
/// Tracks the last error seen on the underlying stream and keeps one
/// memoized [`ConsciousStream`] per tag. A per-tag stream is created either
/// by [`MessageStreamOutput::of_type`] or when the first message with that
/// tag arrives.
pub struct MessageStreamOutput<M> {
    state: Rc<OutputState<M>>,
    subscription: Subscription,
}

impl<M: Message> MessageStreamOutput<M> {
    pub(super) fn new(stream: Stream<M>) -> Self {
        let state = Rc::new(OutputState {
            stream,
            last_error: RefCell::new(Maybe::Absent),
            by_tag: RefCell::new(BTreeMap::new()),
            payloads: RefCell::new(HashMap::new()),
        });

        let on_message: Weak<OutputState<M>> = Rc::downgrade(&state);
        let on_error = Weak::clone(&on_message);
        let subscription = state.stream.subscribe(
            Listeners::new()
                .on_next(move |message: &M| {
                    if let Some(state) = on_message.upgrade() {
                        state.ensure(message.tag(), Maybe::Present(message.clone()));
                    }
                })
                .on_error(move |error: &StreamError| {
                    if let Some(state) = on_error.upgrade() {
                        *state.last_error.borrow_mut() = Maybe::Present(error.clone());
                    }
                }),
        );

        Self {
            state,
            subscription,
        }
    }

    /// The memoized stream of whole messages tagged `tag`.
    ///
    /// Use [`MessageStreamOutput::of_type_with`] or, for [`TaggedMessage`],
    /// [`MessageStreamOutput::payloads_of`] to observe payloads only.
    #[must_use]
    pub fn of_type(&self, tag: &str) -> ConsciousStream<M> {
        self.state.ensure(tag, Maybe::Absent)
    }

    /// The memoized stream of payloads carried by messages tagged `tag`.
    ///
    /// `extract` projects a message onto its payload; messages it maps to
    /// `None` are skipped. The view is memoized per tag and payload type, so
    /// only the first `extract` given for a pair is used. It starts with the
    /// output's last error and with the payload of the last message seen on
    /// the tag, if any.
    pub fn of_type_with<P, F>(&self, tag: &str, extract: F) -> ConsciousStream<P>
    where
        P: Clone + 'static,
        F: Fn(&M) -> Option<P> + 'static,
    {
        let key = (tag.to_string(), TypeId::of::<P>());
        if let Some(existing) = self
            .state
            .payloads
            .borrow()
            .get(&key)
            .and_then(|view| view.downcast_ref::<ConsciousStream<P>>())
        {
            return existing.clone();
        }

        let messages = self.state.ensure(tag, Maybe::Absent);
        let starting = StartingValues {
            value: Maybe::from_nullable(messages.last_value().into_option().and_then(|m| extract(&m))),
            error: self.state.last_error.borrow().clone(),
        };
        let upstream = messages.stream().clone();
        let payloads = Stream::new(move |source: Source<P>| {
            let target = source.clone();
            upstream.forward_with(&source, move |message: &M| {
                if let Some(payload) = extract(message) {
                    target.emit(payload);
                }
            })
        });
        let view = ConsciousStream::with_starting(payloads, starting);

        self.state.payloads.borrow_mut().insert(key, Box::new(view.clone()));
        view
    }

    /// The last error seen on the underlying stream.
    #[must_use]
    pub fn last_error(&self) -> Maybe<StreamError> {
        self.state.last_error.borrow().clone()
    }

    /// Tags that currently have a per-tag stream, in sorted order.
    #[must_use]
    pub fn known_tags(&self) -> Vec<String> {
        self.state.by_tag.borrow().keys().cloned().collect()
    }

    /// Returns true until the message stream is disposed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.stream.is_active()
    }

    /// The stream of every message, regardless of tag.
    #[must_use]
    pub fn underlying_stream(&self) -> &Stream<M> {
        &self.state.stream
    }
}

impl<P: Clone + 'static> MessageStreamOutput<TaggedMessage<P>> {
    /// The memoized stream of bare payloads tagged `tag`.
    #[must_use]
    pub fn payloads_of(&self, tag: &str) -> ConsciousStream<P> {
        self.of_type_with(tag, |message: &TaggedMessage<P>| Some(message.payload().clone()))
    }
}

impl<M> Clone for MessageStreamOutput<M> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            subscription: self.subscription.clone(),
        }
    }
}

impl<M> fmt::Debug for MessageStreamOutput<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStreamOutput")
            .field("tags", &self.state.by_tag.borrow().len())
            .field("subscription", &self.subscription)
            .finish()
    }
}
