//! Lazily activated, multicast streams.
//!
//! A [`Stream`] built with [`Stream::new`] stores an initiate function and runs
//! it exactly once, on the first subscription. Every later subscriber attaches
//! to the same live [`Distributor`]; the producer is never restarted, and it
//! keeps running after the last subscriber leaves. Only [`Stream::dispose`]
//! stops it.

/// Streams that remember their last value and error.
pub mod conscious;
pub mod distributor;
/// Listener triples.
pub mod listeners;
/// Producer-facing emit handle.
pub mod source;
/// Listener registration handles.
pub mod subscription;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::disposable::{Disposable, Teardown};
use crate::error::StreamError;

pub use conscious::{ConsciousStream, StartingValues};
pub use distributor::{Distributor, ListenerId};
pub use listeners::Listeners;
pub use source::Source;
pub use subscription::{Subscription, ValidSubscription};

type Initiate<T> = Box<dyn FnOnce(Source<T>) -> Teardown>;

struct Activation<T> {
    source: Source<T>,
    distributor: Distributor<T>,
    teardown: Teardown,
}

enum StreamState<T> {
    Uninitialized(Initiate<T>),
    Initialized(Activation<T>),
    Released,
}

struct StreamInner<T> {
    state: RefCell<StreamState<T>>,
    disposed: Cell<bool>,
}

/// A push-based stream of values, errors and a completion signal.
///
/// Cheap to clone; clones are handles to the same stream.
pub struct Stream<T> {
    inner: Rc<StreamInner<T>>,
}

impl<T: 'static> Stream<T> {
    /// Creates a stream whose producer starts on the first subscription.
    ///
    /// `initiate` receives the stream's [`Source`] and may return anything
    /// convertible to a [`Teardown`], which runs when the stream is disposed.
    /// The first subscriber is registered before `initiate` runs, so values
    /// emitted synchronously during activation reach it.
    pub fn new<F, R>(initiate: F) -> Self
    where
        F: FnOnce(Source<T>) -> R + 'static,
        R: Into<Teardown>,
    {
        Self::from_state(StreamState::Uninitialized(Box::new(
            move |source: Source<T>| -> Teardown { initiate(source).into() },
        )))
    }

    /// Wraps an already-live source. The stream starts initialized.
    #[must_use]
    pub fn live(source: Source<T>) -> Self {
        Self::live_with_teardown(source, Teardown::None)
    }

    /// Wraps an already-live source with a teardown to run on dispose.
    pub fn live_with_teardown(source: Source<T>, teardown: impl Into<Teardown>) -> Self {
        let distributor = source.distributor().clone();
        Self::from_state(StreamState::Initialized(Activation {
            source,
            distributor,
            teardown: teardown.into(),
        }))
    }

    fn from_state(state: StreamState<T>) -> Self {
        Self {
            inner: Rc::new(StreamInner {
                state: RefCell::new(state),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Registers `listeners`, activating the producer if needed.
    ///
    /// Returns [`Subscription::Null`] when the stream is disposed or its
    /// distributor has already completed.
    pub fn subscribe(&self, listeners: Listeners<T>) -> Subscription {
        if self.inner.disposed.get() {
            return Subscription::Null;
        }
        let Some((distributor, pending)) = self.prepare() else {
            return Subscription::Null;
        };

        let subscription = Subscription::register(&distributor, listeners);

        if let Some((initiate, source)) = pending {
            debug!("stream activated");
            let teardown = initiate(source);
            self.install_teardown(teardown);
        }
        subscription
    }

    /// Subscribes with a value callback only.
    pub fn subscribe_next<F>(&self, on_next: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe(Listeners::new().on_next(on_next))
    }

    /// Subscribes with all three callbacks.
    pub fn subscribe_fns<N, E, C>(&self, on_next: N, on_error: E, on_complete: C) -> Subscription
    where
        N: Fn(&T) + 'static,
        E: Fn(&StreamError) + 'static,
        C: Fn() + 'static,
    {
        self.subscribe(
            Listeners::new()
                .on_next(on_next)
                .on_error(on_error)
                .on_complete(on_complete),
        )
    }

    /// Relays every value, error and completion into `target`.
    pub fn forward_to(&self, target: &Source<T>) -> Subscription {
        self.subscribe(Listeners::forwarding(target))
    }

    /// Relays errors and completion into `target`, handling values with `on_next`.
    pub fn forward_with<U, F>(&self, target: &Source<U>, on_next: F) -> Subscription
    where
        U: 'static,
        F: Fn(&T) + 'static,
    {
        self.subscribe(Listeners::relay(target).on_next(on_next))
    }

    /// Relays into `target` every event that `overrides` leaves unhandled.
    pub fn forward_with_listeners(&self, target: &Source<T>, overrides: Listeners<T>) -> Subscription {
        self.subscribe(overrides.or_forward_to(target))
    }

    /// Applies an operator (or a tuple of operators, left to right).
    pub fn pipe<O>(&self, operator: O) -> Stream<O::Output>
    where
        O: Operator<T>,
    {
        operator.apply(self.clone())
    }

    /// Returns true until [`Stream::dispose`] is called.
    ///
    /// This tracks the stream's own disposal only. A stream whose distributor
    /// completed on its own is still active by this flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.inner.disposed.get()
    }

    /// Returns true once the producer has been started.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(&*self.inner.state.borrow(), StreamState::Initialized(_))
    }

    fn prepare(&self) -> Option<(Distributor<T>, Option<(Initiate<T>, Source<T>)>)> {
        let mut state = self.inner.state.borrow_mut();
        match std::mem::replace(&mut *state, StreamState::Released) {
            StreamState::Initialized(activation) => {
                let distributor = activation.distributor.clone();
                *state = StreamState::Initialized(activation);
                Some((distributor, None))
            }
            StreamState::Uninitialized(initiate) => {
                let distributor = Distributor::new();
                let source = Source::new(distributor.clone());
                *state = StreamState::Initialized(Activation {
                    source: source.clone(),
                    distributor: distributor.clone(),
                    teardown: Teardown::None,
                });
                Some((distributor, Some((initiate, source))))
            }
            StreamState::Released => None,
        }
    }

    fn install_teardown(&self, teardown: Teardown) {
        if teardown.is_none() {
            return;
        }
        let orphaned = match &mut *self.inner.state.borrow_mut() {
            StreamState::Initialized(activation) => {
                activation.teardown = teardown;
                None
            }
            StreamState::Uninitialized(_) | StreamState::Released => Some(teardown),
        };
        // Disposed while the initiate function was running.
        if let Some(teardown) = orphaned {
            teardown.run();
        }
    }

    /// Disposes the stream: completes its distributor, runs the teardown and
    /// releases internal references. Later subscriptions are inert.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let previous = std::mem::replace(&mut *self.inner.state.borrow_mut(), StreamState::Released);
        if let StreamState::Initialized(activation) = previous {
            debug!("stream disposed");
            activation.distributor.emit_complete();
            activation.teardown.run();
        }
    }

    /// The source of an initialized stream.
    #[must_use]
    pub fn source(&self) -> Option<Source<T>> {
        match &*self.inner.state.borrow() {
            StreamState::Initialized(activation) => Some(activation.source.clone()),
            StreamState::Uninitialized(_) | StreamState::Released => None,
        }
    }
}

impl<T: 'static> Disposable for Stream<T> {
    fn dispose(&self) {
        Stream::dispose(self);
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.inner.state.borrow() {
            StreamState::Uninitialized(_) => "uninitialized",
            StreamState::Initialized(_) => "initialized",
            StreamState::Released => "released",
        };
        f.debug_struct("Stream")
            .field("state", &state)
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl<U: 'static> From<Stream<U>> for Teardown {
    fn from(stream: Stream<U>) -> Self {
        Self::disposable(stream)
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Self::disposable(subscription)
    }
}

/// A transformation from one stream into another.
///
/// Implemented for every `FnOnce(Stream<T>) -> Stream<U>`, for `()` (the
/// identity) and for tuples of operators, which compose left to right.
pub trait Operator<T> {
    /// Element type of the resulting stream.
    type Output;

    /// Applies the transformation.
    fn apply(self, stream: Stream<T>) -> Stream<Self::Output>;
}

impl<T, U, F> Operator<T> for F
where
    F: FnOnce(Stream<T>) -> Stream<U>,
{
    type Output = U;

    fn apply(self, stream: Stream<T>) -> Stream<U> {
        self(stream)
    }
}

impl<T> Operator<T> for () {
    type Output = T;

    fn apply(self, stream: Stream<T>) -> Stream<T> {
        stream
    }
}

macro_rules! chained_operator_tuple {
    ($last:ident; $first:ident $(, $op:ident = $idx:tt after $prev:ident)*) => {
        impl<T, $first $(, $op)*> Operator<T> for ($first, $($op,)*)
        where
            $first: Operator<T>,
            $($op: Operator<$prev::Output>,)*
        {
            type Output = $last::Output;

            fn apply(self, stream: Stream<T>) -> Stream<Self::Output> {
                let stream = self.0.apply(stream);
                $(let stream = self.$idx.apply(stream);)*
                stream
            }
        }
    };
}

chained_operator_tuple!(A; A);
chained_operator_tuple!(B; A, B = 1 after A);
chained_operator_tuple!(C; A, B = 1 after A, C = 2 after B);
chained_operator_tuple!(D; A, B = 1 after A, C = 2 after B, D = 3 after C);
chained_operator_tuple!(E; A, B = 1 after A, C = 2 after B, D = 3 after C, E = 4 after D);
chained_operator_tuple!(
    F;
    A,
    B = 1 after A,
    C = 2 after B,
    D = 3 after C,
    E = 4 after D,
    F = 5 after E
);
