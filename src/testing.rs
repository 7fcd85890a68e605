//! Helpers for observing streams in tests.
//!
//! Compiled for this crate's own tests and, with the `test-utils` feature,
//! for downstream test suites.

use std::cell::RefCell;
use std::rc::Rc;

use crate::disposable::Disposable;
use crate::error::StreamError;
use crate::stream::{Listeners, Stream, Subscription};

/// One observed stream event. Errors are kept as their display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T> {
    /// A value.
    Next(T),
    /// An error, rendered with `Display`.
    Error(String),
    /// Completion.
    Complete,
}

/// Records every notification a stream delivers to it.
pub struct Recorder<T> {
    log: Rc<RefCell<Vec<Notification<T>>>>,
    subscription: Subscription,
}

impl<T: Clone + 'static> Recorder<T> {
    /// Subscribes to `stream`, activating it if needed.
    #[must_use]
    pub fn attach(stream: &Stream<T>) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (next, error, complete) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let subscription = stream.subscribe(
            Listeners::new()
                .on_next(move |value: &T| next.borrow_mut().push(Notification::Next(value.clone())))
                .on_error(move |err: &StreamError| {
                    error.borrow_mut().push(Notification::Error(err.to_string()));
                })
                .on_complete(move || complete.borrow_mut().push(Notification::Complete)),
        );
        Self { log, subscription }
    }

    /// Every notification so far, in order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification<T>> {
        self.log.borrow().clone()
    }

    /// The values received so far.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Next(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// The errors received so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns true once completion was received.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.log.borrow().iter().any(|n| matches!(n, Notification::Complete))
    }

    /// The recorder's subscription.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Stops recording.
    pub fn detach(&self) {
        self.subscription.dispose();
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}
