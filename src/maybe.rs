//! Explicit present/absent value container.
//!
//! `Maybe<T>` is a pure value type. Combinators consume `self` and return new
//! instances; nothing here has side effects. It converts freely to and from
//! [`Option`], which is what the `from_nullable` family accepts.

use serde::{Deserialize, Serialize};

use crate::error::{MaybeError, MaybeResult};

/// A value that is either present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Maybe<T> {
    /// A value is present.
    Present(T),
    /// No value.
    Absent,
}

impl<T> Maybe<T> {
    /// Creates a present value.
    #[must_use]
    pub const fn present(value: T) -> Self {
        Self::Present(value)
    }

    /// Creates an absent value.
    #[must_use]
    pub const fn absent() -> Self {
        Self::Absent
    }

    /// `Present` for `Some`, `Absent` for `None`.
    #[must_use]
    pub fn from_nullable(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }

    /// Like [`Maybe::from_nullable`], but a missing value is an error.
    ///
    /// # Errors
    ///
    /// Returns [`MaybeError::UnexpectedAbsence`] when `value` is `None`.
    pub fn from_non_nullable(value: Option<T>) -> MaybeResult<Self> {
        value.map(Self::Present).ok_or(MaybeError::UnexpectedAbsence)
    }

    /// Returns true if a value is present.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Returns true if no value is present.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrow the contents.
    #[must_use]
    pub const fn as_ref(&self) -> Maybe<&T> {
        match self {
            Self::Present(value) => Maybe::Present(value),
            Self::Absent => Maybe::Absent,
        }
    }

    /// Returns `self` if present, otherwise `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Present(_) => self,
            Self::Absent => other,
        }
    }

    /// Returns `self` if present, otherwise the result of `compute`.
    #[must_use]
    pub fn or_compute<F>(self, compute: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Self::Present(_) => self,
            Self::Absent => compute(),
        }
    }

    /// Returns `self` if present, otherwise `Present(value)`.
    #[must_use]
    pub fn or_else(self, value: T) -> Self {
        match self {
            Self::Present(_) => self,
            Self::Absent => Self::Present(value),
        }
    }

    /// Returns `self` if present, otherwise `Present(compute())`.
    #[must_use]
    pub fn or_else_compute<F>(self, compute: F) -> Self
    where
        F: FnOnce() -> T,
    {
        match self {
            Self::Present(_) => self,
            Self::Absent => Self::Present(compute()),
        }
    }

    /// Unwraps the value or returns `fallback`.
    #[must_use]
    pub fn get_or_else(self, fallback: T) -> T {
        match self {
            Self::Present(value) => value,
            Self::Absent => fallback,
        }
    }

    /// Unwraps the value or returns the result of `compute`.
    #[must_use]
    pub fn get_or_else_compute<F>(self, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            Self::Present(value) => value,
            Self::Absent => compute(),
        }
    }

    /// Transforms a present value.
    #[must_use]
    pub fn map<U, F>(self, transform: F) -> Maybe<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Present(value) => Maybe::Present(transform(value)),
            Self::Absent => Maybe::Absent,
        }
    }

    /// Transforms a present value into another `Maybe`.
    #[must_use]
    pub fn flat_map<U, F>(self, transform: F) -> Maybe<U>
    where
        F: FnOnce(T) -> Maybe<U>,
    {
        match self {
            Self::Present(value) => transform(value),
            Self::Absent => Maybe::Absent,
        }
    }

    /// A present value that fails `predicate` becomes absent.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        match self {
            Self::Present(value) if predicate(&value) => Self::Present(value),
            _ => Self::Absent,
        }
    }

    /// Exhaustive match returning a value from either branch.
    pub fn match_with<U, P, A>(self, present: P, absent: A) -> U
    where
        P: FnOnce(T) -> U,
        A: FnOnce() -> U,
    {
        match self {
            Self::Present(value) => present(value),
            Self::Absent => absent(),
        }
    }

    /// Unwraps the value.
    ///
    /// # Errors
    ///
    /// Returns [`MaybeError::EmptyValueAccessed`] when absent.
    pub fn get_or_fail(self) -> MaybeResult<T> {
        self.get_or_fail_with(MaybeError::EmptyValueAccessed)
    }

    /// Unwraps the value or fails with the given error.
    ///
    /// # Errors
    ///
    /// Returns `error` when absent.
    pub fn get_or_fail_with<E>(self, error: E) -> Result<T, E> {
        match self {
            Self::Present(value) => Ok(value),
            Self::Absent => Err(error),
        }
    }

    /// Unwraps the value or fails with a lazily built error.
    ///
    /// # Errors
    ///
    /// Returns the result of `make_error` when absent.
    pub fn get_or_fail_computed<E, F>(self, make_error: F) -> Result<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            Self::Present(value) => Ok(value),
            Self::Absent => Err(make_error()),
        }
    }

    /// Converts into an `Option`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_nullable(value)
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(value: Maybe<T>) -> Self {
        value.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_nullable_fallbacks() {
        assert_eq!(Maybe::<i32>::from_nullable(None).get_or_else(5), 5);
        assert_eq!(Maybe::from_nullable(Some(3)).map(|x| x + 1).get_or_else(0), 4);
    }

    #[test]
    fn test_from_non_nullable() {
        assert_eq!(Maybe::from_non_nullable(Some("a")), Ok(Maybe::Present("a")));
        assert_eq!(
            Maybe::<&str>::from_non_nullable(None),
            Err(MaybeError::UnexpectedAbsence)
        );
    }

    #[test]
    fn test_presence_predicates() {
        assert!(Maybe::present(1).is_present());
        assert!(!Maybe::present(1).is_absent());
        assert!(Maybe::<i32>::absent().is_absent());
    }

    #[test]
    fn test_or_family() {
        assert_eq!(Maybe::present(1).or(Maybe::present(2)), Maybe::present(1));
        assert_eq!(Maybe::absent().or(Maybe::present(2)), Maybe::present(2));
        assert_eq!(Maybe::absent().or_compute(|| Maybe::present(9)), Maybe::present(9));
        assert_eq!(Maybe::absent().or_else(3), Maybe::present(3));
        assert_eq!(Maybe::present(1).or_else_compute(|| 3), Maybe::present(1));
        assert_eq!(Maybe::<i32>::absent().get_or_else_compute(|| 8), 8);
    }

    #[test]
    fn test_compute_not_called_when_present() {
        let value = Maybe::present(1).get_or_else_compute(|| panic!("must not run"));
        assert_eq!(value, 1);
    }

    #[test]
    fn test_flat_map_and_filter() {
        let halve = |x: i32| if x % 2 == 0 { Maybe::present(x / 2) } else { Maybe::absent() };
        assert_eq!(Maybe::present(4).flat_map(halve), Maybe::present(2));
        assert_eq!(Maybe::present(3).flat_map(halve), Maybe::absent());
        assert_eq!(Maybe::present(3).filter(|x| *x > 2), Maybe::present(3));
        assert_eq!(Maybe::present(1).filter(|x| *x > 2), Maybe::absent());
    }

    #[test]
    fn test_match_with() {
        let describe = |m: Maybe<i32>| m.match_with(|v| format!("got {v}"), || "nothing".to_string());
        assert_eq!(describe(Maybe::present(2)), "got 2");
        assert_eq!(describe(Maybe::absent()), "nothing");
    }

    #[test]
    fn test_get_or_fail_family() {
        assert_eq!(Maybe::present(1).get_or_fail(), Ok(1));
        assert_eq!(Maybe::<i32>::absent().get_or_fail(), Err(MaybeError::EmptyValueAccessed));
        assert_eq!(Maybe::<i32>::absent().get_or_fail_with("missing"), Err("missing"));
        assert_eq!(
            Maybe::<i32>::absent().get_or_fail_computed(|| "computed".len()),
            Err(8)
        );
    }

    #[test]
    fn test_option_round_trip() {
        let m: Maybe<i32> = Some(4).into();
        let o: Option<i32> = m.into();
        assert_eq!(o, Some(4));
        assert_eq!(Maybe::<i32>::default(), Maybe::Absent);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Maybe::present(7)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "present", "value": 7}));
        let absent: Maybe<i32> = serde_json::from_value(serde_json::json!({"kind": "absent"})).unwrap();
        assert!(absent.is_absent());
    }
}
