use std::fmt;

use crate::error::StreamError;

use super::distributor::Distributor;

/// Producer-facing emit handle bound to one distributor.
pub struct Source<T> {
    distributor: Distributor<T>,
}

impl<T: 'static> Source<T> {
    /// Binds a new source to `distributor`.
    #[must_use]
    pub fn new(distributor: Distributor<T>) -> Self {
        Self { distributor }
    }

    /// Emits a value.
    pub fn emit(&self, value: T) {
        self.distributor.emit_next(&value);
    }

    /// Emits a borrowed value.
    pub fn emit_ref(&self, value: &T) {
        self.distributor.emit_next(value);
    }

    /// Emits an error.
    pub fn emit_error(&self, error: StreamError) {
        self.distributor.emit_error(&error);
    }

    /// Completes the bound distributor.
    pub fn emit_complete(&self) {
        self.distributor.emit_complete();
    }

    /// Returns true until the bound distributor completes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.distributor.is_active()
    }

    /// The bound distributor.
    #[must_use]
    pub fn distributor(&self) -> &Distributor<T> {
        &self.distributor
    }
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            distributor: self.distributor.clone(),
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("distributor", &self.distributor)
            .finish()
    }
}
