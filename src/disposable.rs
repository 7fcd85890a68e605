//! Resource release contract.
//!
//! Every handle in this crate that owns something releasable implements
//! [`Disposable`]. `dispose` is idempotent: calling it twice has the same
//! effect as calling it once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Idempotent release of a resource.
pub trait Disposable {
    /// Releases the resource. Repeated calls are no-ops.
    fn dispose(&self);
}

impl<D: Disposable + ?Sized> Disposable for Rc<D> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

impl<D: Disposable + ?Sized> Disposable for Box<D> {
    fn dispose(&self) {
        (**self).dispose();
    }
}

/// A release action that runs at most once.
pub struct DisposeAction {
    action: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl DisposeAction {
    /// Wraps `action` so that only the first `dispose` runs it.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            action: RefCell::new(Some(Box::new(action))),
        }
    }

    /// Returns true once the action has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }
}

impl Disposable for DisposeAction {
    fn dispose(&self) {
        // Release the borrow before running: the action may touch this value.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }
}

impl fmt::Debug for DisposeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposeAction")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn same_member(a: &Rc<dyn Disposable>, b: &Rc<dyn Disposable>) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

/// A shared set of disposables released together.
///
/// Clones share the same membership. Members are identified by `Rc` pointer
/// identity, so the same member is stored at most once. The set stays usable
/// after `dispose`: new members can be added and released by a later call.
#[derive(Clone, Default)]
pub struct CompositeDisposable {
    members: Rc<RefCell<Vec<Rc<dyn Disposable>>>>,
}

impl CompositeDisposable {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a composite holding `members`.
    pub fn with_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Rc<dyn Disposable>>,
    {
        let composite = Self::new();
        composite.add_all(members);
        composite
    }

    /// Adds a member. Adding an existing member is a no-op.
    pub fn add(&self, member: Rc<dyn Disposable>) {
        let mut members = self.members.borrow_mut();
        if !members.iter().any(|m| same_member(m, &member)) {
            members.push(member);
        }
    }

    /// Adds a concrete disposable and returns its membership key.
    pub fn insert<D>(&self, disposable: D) -> Rc<dyn Disposable>
    where
        D: Disposable + 'static,
    {
        let member: Rc<dyn Disposable> = Rc::new(disposable);
        self.add(Rc::clone(&member));
        member
    }

    /// Adds every member of `members`.
    pub fn add_all<I>(&self, members: I)
    where
        I: IntoIterator<Item = Rc<dyn Disposable>>,
    {
        for member in members {
            self.add(member);
        }
    }

    /// Removes a member without disposing it.
    pub fn remove(&self, member: &Rc<dyn Disposable>) {
        self.members.borrow_mut().retain(|m| !same_member(m, member));
    }

    /// Removes every listed member without disposing them.
    pub fn remove_all<'a, I>(&self, members: I)
    where
        I: IntoIterator<Item = &'a Rc<dyn Disposable>>,
    {
        for member in members {
            self.remove(member);
        }
    }

    /// Forgets all members without disposing them.
    pub fn clear(&self) {
        self.members.borrow_mut().clear();
    }

    /// Number of current members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        // Detach first so members may add/remove during their own dispose.
        let members = std::mem::take(&mut *self.members.borrow_mut());
        for member in members {
            member.dispose();
        }
    }
}

impl fmt::Debug for CompositeDisposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDisposable")
            .field("members", &self.len())
            .finish()
    }
}

/// What a stream's initiate function hands back for release on dispose.
#[derive(Default)]
pub enum Teardown {
    /// Nothing to release.
    #[default]
    None,
    /// A one-shot release action.
    Action(DisposeAction),
    /// A disposable resource.
    Disposable(Rc<dyn Disposable>),
}

impl Teardown {
    /// Teardown that runs `action` once.
    pub fn action<F>(action: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::Action(DisposeAction::new(action))
    }

    /// Teardown that disposes `disposable`.
    pub fn disposable<D>(disposable: D) -> Self
    where
        D: Disposable + 'static,
    {
        Self::Disposable(Rc::new(disposable))
    }

    /// Returns true if there is nothing to release.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Performs the release.
    pub fn run(self) {
        match self {
            Self::None => {}
            Self::Action(action) => action.dispose(),
            Self::Disposable(disposable) => disposable.dispose(),
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Teardown::None"),
            Self::Action(_) => f.write_str("Teardown::Action"),
            Self::Disposable(_) => f.write_str("Teardown::Disposable"),
        }
    }
}

impl From<()> for Teardown {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<DisposeAction> for Teardown {
    fn from(action: DisposeAction) -> Self {
        Self::Action(action)
    }
}

impl From<Rc<dyn Disposable>> for Teardown {
    fn from(disposable: Rc<dyn Disposable>) -> Self {
        Self::Disposable(disposable)
    }
}

impl From<CompositeDisposable> for Teardown {
    fn from(composite: CompositeDisposable) -> Self {
        Self::disposable(composite)
    }
}

impl<T: Into<Teardown>> From<Option<T>> for Teardown {
    fn from(teardown: Option<T>) -> Self {
        teardown.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, DisposeAction) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, DisposeAction::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn test_dispose_action_runs_once() {
        let (count, action) = counter();
        assert!(!action.is_disposed());
        action.dispose();
        action.dispose();
        assert_eq!(count.get(), 1);
        assert!(action.is_disposed());
    }

    #[test]
    fn test_composite_disposes_all_members_once() {
        let composite = CompositeDisposable::new();
        let (a, action_a) = counter();
        let (b, action_b) = counter();
        composite.insert(action_a);
        composite.insert(action_b);
        assert_eq!(composite.len(), 2);

        composite.dispose();
        composite.dispose();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
        assert!(composite.is_empty());
    }

    #[test]
    fn test_composite_membership_is_by_identity() {
        let composite = CompositeDisposable::new();
        let (_, action) = counter();
        let member: Rc<dyn Disposable> = Rc::new(action);
        composite.add(Rc::clone(&member));
        composite.add(Rc::clone(&member));
        assert_eq!(composite.len(), 1);

        composite.remove(&member);
        assert!(composite.is_empty());
    }

    #[test]
    fn test_composite_remove_does_not_dispose() {
        let composite = CompositeDisposable::new();
        let (count, action) = counter();
        let member = composite.insert(action);
        composite.remove_all([&member]);
        composite.dispose();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_composite_reusable_after_dispose() {
        let composite = CompositeDisposable::new();
        let (first, action) = counter();
        composite.insert(action);
        composite.dispose();

        let (second, action) = counter();
        composite.insert(action);
        composite.dispose();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_composite_member_may_mutate_during_dispose() {
        let composite = CompositeDisposable::new();
        let inner = composite.clone();
        composite.insert(DisposeAction::new(move || {
            inner.insert(DisposeAction::new(|| {}));
        }));
        composite.dispose();
        assert_eq!(composite.len(), 1);
    }

    #[test]
    fn test_composite_clear_forgets_members() {
        let (count, action) = counter();
        let composite = CompositeDisposable::with_members([Rc::new(action) as Rc<dyn Disposable>]);
        composite.clear();
        composite.dispose();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_teardown_variants() {
        let (count, action) = counter();
        Teardown::from(action).run();
        assert_eq!(count.get(), 1);

        assert!(Teardown::from(()).is_none());
        assert!(Teardown::from(None::<DisposeAction>).is_none());

        let (count, action) = counter();
        let composite = CompositeDisposable::new();
        composite.insert(action);
        Teardown::from(composite).run();
        assert_eq!(count.get(), 1);
    }
}
