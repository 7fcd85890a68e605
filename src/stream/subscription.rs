use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::disposable::Disposable;
use crate::error::StreamError;

use super::distributor::{Distributor, ListenerId, ListenerRegistry};
use super::listeners::Listeners;

/// A registration with a live distributor.
///
/// Holds only a weak reference to the distributor: an outstanding
/// subscription never keeps a stream's registry alive.
#[derive(Clone)]
pub struct ValidSubscription {
    registry: Weak<dyn ListenerRegistry>,
    id: ListenerId,
    active: Rc<Cell<bool>>,
}

impl ValidSubscription {
    /// The listener id inside the distributor.
    #[must_use]
    pub const fn listener_id(&self) -> ListenerId {
        self.id
    }
}

impl fmt::Debug for ValidSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidSubscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

/// Handle for one listener registration.
///
/// Disposing it detaches the listener without affecting the producer.
/// Dropping it does not unsubscribe.
#[derive(Debug, Clone)]
pub enum Subscription {
    /// A registration with a distributor.
    Valid(ValidSubscription),
    /// An inert subscription, always inactive.
    Null,
}

impl Subscription {
    /// Registers `listeners` with `distributor`.
    ///
    /// Each callback is guarded by the subscription's active flag. Completion
    /// clears the flag before the user callback runs. Returns
    /// [`Subscription::Null`] if the distributor has already completed.
    pub(crate) fn register<T: 'static>(distributor: &Distributor<T>, listeners: Listeners<T>) -> Self {
        let active = Rc::new(Cell::new(true));
        let Listeners {
            next,
            error,
            complete,
        } = listeners;

        let mut guarded = Listeners::new();
        if let Some(next) = next {
            let active = Rc::clone(&active);
            guarded = guarded.on_next(move |value: &T| {
                if active.get() {
                    next(value);
                }
            });
        }
        if let Some(on_error) = error {
            let active = Rc::clone(&active);
            guarded = guarded.on_error(move |err: &StreamError| {
                if active.get() {
                    on_error(err);
                }
            });
        }
        let done = Rc::clone(&active);
        guarded = guarded.on_complete(move || {
            if done.replace(false) {
                if let Some(complete) = &complete {
                    complete();
                }
            }
        });

        match distributor.add_listeners(guarded) {
            Some(id) => {
                let registry: Rc<dyn ListenerRegistry> = distributor.inner.clone();
                Self::Valid(ValidSubscription {
                    registry: Rc::downgrade(&registry),
                    id,
                    active,
                })
            }
            None => Self::Null,
        }
    }

    /// Returns true while the listener is registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Valid(valid) => valid.active.get(),
            Self::Null => false,
        }
    }

    /// Returns true for an inert subscription.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Disposable for Subscription {
    fn dispose(&self) {
        let Self::Valid(valid) = self else {
            return;
        };
        if valid.active.replace(false) {
            if let Some(registry) = valid.registry.upgrade() {
                registry.remove_listeners(valid.id);
            }
        }
    }
}
