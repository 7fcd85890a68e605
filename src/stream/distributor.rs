//! In-process multicast hub.
//!
//! A distributor owns the listener registry of one live stream and fans out
//! next/error/complete notifications synchronously, in registration order.
//! Fan-out iterates over a snapshot of the registry, so callbacks may
//! subscribe, unsubscribe or emit re-entrantly.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::error::StreamError;

use super::listeners::Listeners;

/// Identifier of one listener registration within a distributor.
///
/// Ids increase monotonically and are never reused by the same distributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

enum DistributorState<T> {
    Active {
        listeners: BTreeMap<ListenerId, Listeners<T>>,
    },
    Inactive,
}

pub(crate) struct DistributorInner<T> {
    state: RefCell<DistributorState<T>>,
    next_id: Cell<u64>,
}

/// Type-erased view used by subscriptions to deregister themselves.
pub(crate) trait ListenerRegistry {
    fn remove_listeners(&self, id: ListenerId);
}

impl<T> ListenerRegistry for DistributorInner<T> {
    fn remove_listeners(&self, id: ListenerId) {
        if let DistributorState::Active { listeners } = &mut *self.state.borrow_mut() {
            listeners.remove(&id);
        }
    }
}

/// The live multicast hub behind a stream.
///
/// Cheap to clone; clones share the same registry.
pub struct Distributor<T> {
    pub(crate) inner: Rc<DistributorInner<T>>,
}

impl<T: 'static> Distributor<T> {
    /// Creates an active distributor with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DistributorInner {
                state: RefCell::new(DistributorState::Active {
                    listeners: BTreeMap::new(),
                }),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Registers a listener triple.
    ///
    /// Returns `None` when the distributor has already completed.
    pub fn add_listeners(&self, listeners: Listeners<T>) -> Option<ListenerId> {
        let mut state = self.inner.state.borrow_mut();
        match &mut *state {
            DistributorState::Active { listeners: registry } => {
                let id = ListenerId(self.inner.next_id.get());
                self.inner.next_id.set(id.0 + 1);
                registry.insert(id, listeners);
                trace!(listener_id = id.0, "listener registered");
                Some(id)
            }
            DistributorState::Inactive => None,
        }
    }

    /// Deregisters a listener triple. Inert once completed.
    pub fn remove_listeners(&self, id: ListenerId) {
        self.inner.remove_listeners(id);
    }

    /// Delivers a value to every `on_next` listener.
    ///
    /// After completion the value is dropped with a warning.
    pub fn emit_next(&self, value: &T) {
        let Some(snapshot) = self.snapshot() else {
            warn!("emission dropped: distributor already completed");
            return;
        };
        for listeners in snapshot {
            if let Some(next) = &listeners.next {
                next(value);
            }
        }
    }

    /// Delivers an error to every `on_error` listener. Dropped after completion.
    pub fn emit_error(&self, error: &StreamError) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        for listeners in snapshot {
            if let Some(on_error) = &listeners.error {
                on_error(error);
            }
        }
    }

    /// Completes the distributor and notifies every `on_complete` listener once.
    ///
    /// The distributor is inactive before any callback runs, so calling this
    /// again, even from inside a callback, does nothing.
    pub fn emit_complete(&self) {
        let previous = std::mem::replace(
            &mut *self.inner.state.borrow_mut(),
            DistributorState::Inactive,
        );
        let DistributorState::Active { listeners } = previous else {
            return;
        };
        trace!(listeners = listeners.len(), "distributor completed");
        for listeners in listeners.into_values() {
            if let Some(complete) = &listeners.complete {
                complete();
            }
        }
    }

    /// Returns true until the distributor completes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(&*self.inner.state.borrow(), DistributorState::Active { .. })
    }

    /// Number of registered listener triples.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        match &*self.inner.state.borrow() {
            DistributorState::Active { listeners } => listeners.len(),
            DistributorState::Inactive => 0,
        }
    }

    fn snapshot(&self) -> Option<Vec<Listeners<T>>> {
        match &*self.inner.state.borrow() {
            DistributorState::Active { listeners } => Some(listeners.values().cloned().collect()),
            DistributorState::Inactive => None,
        }
    }
}

impl<T: 'static> Default for Distributor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Distributor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Distributor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = matches!(&*self.inner.state.borrow(), DistributorState::Active { .. });
        f.debug_struct("Distributor")
            .field("active", &active)
            .field("next_id", &self.inner.next_id.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn collecting(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Listeners<i32> {
        let next = Rc::clone(log);
        let error = Rc::clone(log);
        let complete = Rc::clone(log);
        Listeners::new()
            .on_next(move |v: &i32| next.borrow_mut().push(format!("{name}:{v}")))
            .on_error(move |e: &StreamError| error.borrow_mut().push(format!("{name}:err:{e}")))
            .on_complete(move || complete.borrow_mut().push(format!("{name}:done")))
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let distributor = Distributor::new();
        distributor.add_listeners(collecting(&log, "a"));
        distributor.add_listeners(collecting(&log, "b"));

        distributor.emit_next(&1);
        distributor.emit_error(&StreamError::msg("x"));
        distributor.emit_complete();

        assert_eq!(
            *log.borrow(),
            vec!["a:1", "b:1", "a:err:x", "b:err:x", "a:done", "b:done"]
        );
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let distributor = Distributor::<i32>::new();
        let first = distributor.add_listeners(Listeners::new()).unwrap();
        distributor.remove_listeners(first);
        let second = distributor.add_listeners(Listeners::new()).unwrap();
        assert!(second > first);
        assert_eq!(distributor.listener_count(), 1);
    }

    #[test]
    fn test_completed_distributor_ignores_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let distributor = Distributor::new();
        distributor.add_listeners(collecting(&log, "a"));
        distributor.emit_complete();
        distributor.emit_complete();
        distributor.emit_next(&5);
        distributor.emit_error(&StreamError::msg("late"));

        assert_eq!(*log.borrow(), vec!["a:done"]);
        assert!(!distributor.is_active());
        assert!(distributor.add_listeners(Listeners::new()).is_none());
    }

    #[test]
    fn test_remove_from_inside_callback() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let distributor = Distributor::new();
        let own_id = Rc::new(Cell::new(None));

        let handle = distributor.clone();
        let id_slot = Rc::clone(&own_id);
        let seen = Rc::clone(&log);
        let id = distributor.add_listeners(Listeners::new().on_next(move |v: &i32| {
            seen.borrow_mut().push(format!("once:{v}"));
            if let Some(id) = id_slot.get() {
                handle.remove_listeners(id);
            }
        }));
        own_id.set(id);
        distributor.add_listeners(collecting(&log, "b"));

        distributor.emit_next(&1);
        distributor.emit_next(&2);
        assert_eq!(*log.borrow(), vec!["once:1", "b:1", "b:2"]);
    }

    #[test]
    fn test_complete_from_inside_complete_is_noop() {
        let count = Rc::new(Cell::new(0));
        let distributor = Distributor::<i32>::new();
        let handle = distributor.clone();
        let c = Rc::clone(&count);
        distributor.add_listeners(Listeners::new().on_complete(move || {
            c.set(c.get() + 1);
            handle.emit_complete();
        }));
        distributor.emit_complete();
        assert_eq!(count.get(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emission_after_completion_logs_warning() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let distributor = Distributor::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        distributor.add_listeners(collecting(&log, "a"));
        tracing::subscriber::with_default(subscriber, || {
            distributor.emit_complete();
            distributor.emit_next(&1);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("emission dropped: distributor already completed"));
        assert_eq!(*log.borrow(), vec!["a:done"]);
    }
}
