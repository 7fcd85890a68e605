use std::cell::Cell;
use std::rc::Rc;

use crate::disposable::{CompositeDisposable, Disposable, Teardown};
use crate::stream::{Listeners, Source, Stream, Subscription};

/// Subscribes upstream and hands the subscription to `upstream` unless the
/// operator already finished while subscribing.
fn hold_upstream(upstream: &CompositeDisposable, subscription: Subscription, finished: &Cell<bool>) {
    if finished.get() {
        subscription.dispose();
    } else {
        upstream.insert(subscription);
    }
}

/// Forwards the first `count` values, then completes.
///
/// Upstream is released as soon as the last value has been forwarded.
/// `take(0)` completes on activation without subscribing upstream.
#[must_use]
pub fn take<T: 'static>(count: usize) -> impl FnOnce(Stream<T>) -> Stream<T> {
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| -> Teardown {
            if count == 0 {
                source.emit_complete();
                return Teardown::None;
            }

            let upstream = CompositeDisposable::new();
            let finished = Rc::new(Cell::new(false));
            let remaining = Cell::new(count);

            let release = upstream.clone();
            let done = Rc::clone(&finished);
            let target = source.clone();
            let subscription = stream.subscribe(Listeners::relay(&source).on_next(move |value: &T| {
                let left = remaining.get();
                if left == 0 {
                    return;
                }
                remaining.set(left - 1);
                target.emit_ref(value);
                if left == 1 {
                    done.set(true);
                    target.emit_complete();
                    release.dispose();
                }
            }));
            hold_upstream(&upstream, subscription, &finished);
            upstream.into()
        })
    }
}

/// Forwards values while `predicate` holds.
///
/// The first failing value is dropped, the output completes and upstream is
/// released.
#[must_use]
pub fn take_while<T, P>(predicate: P) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: 'static,
    P: Fn(&T) -> bool + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let upstream = CompositeDisposable::new();
            let finished = Rc::new(Cell::new(false));

            let release = upstream.clone();
            let done = Rc::clone(&finished);
            let target = source.clone();
            let subscription = stream.subscribe(Listeners::relay(&source).on_next(move |value: &T| {
                if done.get() {
                    return;
                }
                if predicate(value) {
                    target.emit_ref(value);
                } else {
                    done.set(true);
                    target.emit_complete();
                    release.dispose();
                }
            }));
            hold_upstream(&upstream, subscription, &finished);
            upstream
        })
    }
}
