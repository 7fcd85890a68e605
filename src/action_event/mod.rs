//! Two-sided typed channels.
//!
//! An [`ActionEventStream`] pairs a message stream of actions with a message
//! stream of events and hands out two crossed views. The public view writes
//! actions and reads events; the internal view reads actions and writes
//! events. A caller and a handler can talk through it without knowing each
//! other.

mod views;

use std::fmt;

use crate::disposable::Disposable;
use crate::message::{Message, MessageStream};

pub use views::{ActionEventInternalView, ActionEventPublicView};

/// A pair of independent message streams with crossed views.
pub struct ActionEventStream<A: Message, E: Message> {
    actions: MessageStream<A>,
    events: MessageStream<E>,
    public: ActionEventPublicView<A, E>,
    internal: ActionEventInternalView<A, E>,
}

impl<A: Message, E: Message> ActionEventStream<A, E> {
    /// Creates both message streams and their views.
    #[must_use]
    pub fn new() -> Self {
        let actions = MessageStream::new();
        let events = MessageStream::new();
        let public = ActionEventPublicView::new(actions.input().clone(), events.output().clone());
        let internal = ActionEventInternalView::new(actions.output().clone(), events.input().clone());
        Self {
            actions,
            events,
            public,
            internal,
        }
    }

    /// The caller's view: write actions, read events.
    #[must_use]
    pub fn public_view(&self) -> &ActionEventPublicView<A, E> {
        &self.public
    }

    /// The handler's view: read actions, write events.
    #[must_use]
    pub fn internal_view(&self) -> &ActionEventInternalView<A, E> {
        &self.internal
    }

    /// Disposes both message streams.
    pub fn dispose(&self) {
        self.actions.dispose();
        self.events.dispose();
    }
}

impl<A: Message, E: Message> Default for ActionEventStream<A, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Message, E: Message> Disposable for ActionEventStream<A, E> {
    fn dispose(&self) {
        ActionEventStream::dispose(self);
    }
}

impl<A: Message, E: Message> fmt::Debug for ActionEventStream<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEventStream")
            .field("actions", &self.actions)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TaggedMessage;
    use crate::maybe::Maybe;

    type Action = TaggedMessage<u32>;
    type Event = TaggedMessage<String>;

    #[test]
    fn test_views_are_crossed() {
        let channel = ActionEventStream::<Action, Event>::new();
        let handler = channel.internal_view().clone();
        let replies = handler.events().clone();
        handler.actions().of_type("add").stream().subscribe_next(move |action: &Action| {
            replies.emit(TaggedMessage::new("added", format!("+{}", action.payload())));
        });

        let caller = channel.public_view();
        let added = caller.events().of_type("added");
        caller.actions().emit(TaggedMessage::new("add", 3));

        assert_eq!(
            added.last_value().map(TaggedMessage::into_payload),
            Maybe::Present("+3".to_string())
        );
        assert!(channel.internal_view().actions().last_error().is_absent());
    }

    #[test]
    fn test_dispose_closes_both_sides() {
        let channel = ActionEventStream::<Action, Event>::new();
        channel.dispose();
        assert!(!channel.public_view().actions().is_active());
        assert!(!channel.public_view().events().is_active());
        assert!(!channel.internal_view().actions().is_active());
        assert!(!channel.internal_view().events().is_active());
    }
}
