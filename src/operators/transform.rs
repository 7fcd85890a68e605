use std::cell::RefCell;
use std::rc::Rc;

use crate::disposable::{CompositeDisposable, Disposable};
use crate::stream::{Listeners, Source, Stream};

/// Emits `transform(value)` for every upstream value.
#[must_use]
pub fn map<T, U, F>(transform: F) -> impl FnOnce(Stream<T>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> U + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<U>| {
            let target = source.clone();
            stream.forward_with(&source, move |value| target.emit(transform(value)))
        })
    }
}

/// Forwards only the values for which `predicate` holds.
#[must_use]
pub fn filter<T, P>(predicate: P) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: 'static,
    P: Fn(&T) -> bool + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let target = source.clone();
            stream.forward_with(&source, move |value| {
                if predicate(value) {
                    target.emit_ref(value);
                }
            })
        })
    }
}

/// Running accumulator state for one activation of `scan`.
struct Accumulator<U> {
    current: Option<U>,
    /// Position of the next output value.
    index: usize,
}

impl<U: Clone> Accumulator<U> {
    fn push(&mut self, next: U) -> U {
        self.index += 1;
        self.current = Some(next.clone());
        next
    }
}

/// Emits a running accumulation without a seed.
///
/// The first value is emitted as-is and becomes the accumulator. Each later
/// value is folded in with `accumulate(&acc, &value, index)`, where `index`
/// is the position of the result in the output.
#[must_use]
pub fn scan<T, F>(accumulate: F) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Clone + 'static,
    F: Fn(&T, &T, usize) -> T + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let state = RefCell::new(Accumulator {
                current: None,
                index: 0,
            });
            let target = source.clone();
            stream.forward_with(&source, move |value: &T| {
                let next = {
                    let mut state = state.borrow_mut();
                    let next = match &state.current {
                        Some(acc) => accumulate(acc, value, state.index),
                        None => value.clone(),
                    };
                    state.push(next)
                };
                target.emit(next);
            })
        })
    }
}

/// Emits `seed` on activation, then a running accumulation.
///
/// The seed occupies output position zero, so the first upstream value is
/// folded in with index one.
#[must_use]
pub fn scan_seeded<T, U, F>(accumulate: F, seed: U) -> impl FnOnce(Stream<T>) -> Stream<U>
where
    T: 'static,
    U: Clone + 'static,
    F: Fn(&U, &T, usize) -> U + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<U>| {
            source.emit_ref(&seed);
            let state = RefCell::new(Accumulator {
                current: Some(seed),
                index: 1,
            });
            let target = source.clone();
            stream.forward_with(&source, move |value: &T| {
                let next = {
                    let mut state = state.borrow_mut();
                    let Some(acc) = &state.current else {
                        return;
                    };
                    let next = accumulate(acc, value, state.index);
                    state.push(next)
                };
                target.emit(next);
            })
        })
    }
}

/// Maps every value to an inner stream and flattens all inner streams.
///
/// Inner values and errors are forwarded. Inner completion does not complete
/// the output; upstream completion does. An inner stream is disposed and
/// released as soon as it completes; the rest are disposed on teardown.
#[must_use]
pub fn flat_map<T, U, F>(transform: F) -> impl FnOnce(Stream<T>) -> Stream<U>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> Stream<U> + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<U>| {
            let owned = CompositeDisposable::new();
            let inner_owner = owned.clone();
            let target = source.clone();
            let upstream = stream.forward_with(&source, move |value: &T| {
                let inner = transform(value);
                let member = inner_owner.insert(inner.clone());
                let finished = Rc::downgrade(&member);
                let owner = inner_owner.clone();
                let next = target.clone();
                let error = target.clone();
                inner.subscribe(
                    Listeners::new()
                        .on_next(move |value: &U| next.emit_ref(value))
                        .on_error(move |err| error.emit_error(err.clone()))
                        .on_complete(move || {
                            if let Some(member) = finished.upgrade() {
                                owner.remove(&member);
                                member.dispose();
                            }
                        }),
                );
            });
            owned.insert(upstream);
            owned
        })
    }
}
