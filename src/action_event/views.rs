use crate::message::{Message, MessageStreamInput, MessageStreamOutput};

/// The caller's side: issues actions, observes events.
#[derive(Debug)]
pub struct ActionEventPublicView<A, E> {
    actions: MessageStreamInput<A>,
    events: MessageStreamOutput<E>,
}

impl<A: Message, E: Message> ActionEventPublicView<A, E> {
    pub(super) fn new(actions: MessageStreamInput<A>, events: MessageStreamOutput<E>) -> Self {
        Self { actions, events }
    }

    /// Where actions are written.
    #[must_use]
    pub fn actions(&self) -> &MessageStreamInput<A> {
        &self.actions
    }

    /// Where events are read.
    #[must_use]
    pub fn events(&self) -> &MessageStreamOutput<E> {
        &self.events
    }
}

impl<A, E> Clone for ActionEventPublicView<A, E> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            events: self.events.clone(),
        }
    }
}

/// The handler's side: observes actions, issues events.
#[derive(Debug)]
pub struct ActionEventInternalView<A, E> {
    actions: MessageStreamOutput<A>,
    events: MessageStreamInput<E>,
}

impl<A: Message, E: Message> ActionEventInternalView<A, E> {
    pub(super) fn new(actions: MessageStreamOutput<A>, events: MessageStreamInput<E>) -> Self {
        Self { actions, events }
    }

    /// Where actions are read.
    #[must_use]
    pub fn actions(&self) -> &MessageStreamOutput<A> {
        &self.actions
    }

    /// Where events are written.
    #[must_use]
    pub fn events(&self) -> &MessageStreamInput<E> {
        &self.events
    }
}

impl<A, E> Clone for ActionEventInternalView<A, E> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            events: self.events.clone(),
        }
    }
}
