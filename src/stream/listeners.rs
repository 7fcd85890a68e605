use std::fmt;
use std::rc::Rc;

use crate::error::StreamError;

use super::source::Source;

pub(crate) type NextFn<T> = Rc<dyn Fn(&T)>;
pub(crate) type ErrorFn = Rc<dyn Fn(&StreamError)>;
pub(crate) type CompleteFn = Rc<dyn Fn()>;

/// The listener triple registered with a stream.
///
/// Every callback is optional. Build one with the chained setters:
///
/// ```rust,ignore
/// let listeners = Listeners::new()
///     .on_next(|v: &i32| println!("{v}"))
///     .on_complete(|| println!("done"));
/// ```
pub struct Listeners<T> {
    pub(crate) next: Option<NextFn<T>>,
    pub(crate) error: Option<ErrorFn>,
    pub(crate) complete: Option<CompleteFn>,
}

impl<T: 'static> Listeners<T> {
    /// A triple with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// Relays all three events into `target`.
    #[must_use]
    pub fn forwarding(target: &Source<T>) -> Self {
        let next = target.clone();
        Self::relay(target).on_next(move |value: &T| next.emit_ref(value))
    }

    /// Relays errors and completion into `target`; `on_next` is left unset so
    /// the caller can supply a transformation.
    #[must_use]
    pub fn relay<U: 'static>(target: &Source<U>) -> Self {
        let error = target.clone();
        let complete = target.clone();
        Self::new()
            .on_error(move |err: &StreamError| error.emit_error(err.clone()))
            .on_complete(move || complete.emit_complete())
    }

    /// Fills every unset callback with a relay into `target`.
    #[must_use]
    pub fn or_forward_to(self, target: &Source<T>) -> Self {
        let fallback = Self::forwarding(target);
        Self {
            next: self.next.or(fallback.next),
            error: self.error.or(fallback.error),
            complete: self.complete.or(fallback.complete),
        }
    }

    /// Sets the value callback.
    #[must_use]
    pub fn on_next<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        self.next = Some(Rc::new(f));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&StreamError) + 'static,
    {
        self.error = Some(Rc::new(f));
        self
    }

    /// Sets the completion callback.
    #[must_use]
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn() + 'static,
    {
        self.complete = Some(Rc::new(f));
        self
    }

    /// Returns true if no callback is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next.is_none() && self.error.is_none() && self.complete.is_none()
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("on_next", &self.next.is_some())
            .field("on_error", &self.error.is_some())
            .field("on_complete", &self.complete.is_some())
            .finish()
    }
}
