use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use crate::constructors::interval;
use crate::disposable::{CompositeDisposable, Disposable};
use crate::scheduler::{Scheduler, TimerId};
use crate::stream::{Listeners, Source, Stream};

/// Timers scheduled by one activation of `delay`.
struct PendingTimers<S> {
    scheduler: S,
    ids: RefCell<HashSet<TimerId>>,
}

impl<S: Scheduler + 'static> PendingTimers<S> {
    fn schedule(self: &Rc<Self>, after: Duration, task: impl FnOnce() + 'static) {
        let own_id = Rc::new(Cell::new(None));
        let slot = Rc::clone(&own_id);
        let pending = Rc::downgrade(self);
        let id = self.scheduler.schedule(
            after,
            Box::new(move || {
                if let (Some(pending), Some(id)) = (pending.upgrade(), slot.get()) {
                    pending.ids.borrow_mut().remove(&id);
                }
                task();
            }),
        );
        own_id.set(Some(id));
        self.ids.borrow_mut().insert(id);
    }
}

impl<S: Scheduler> Disposable for PendingTimers<S> {
    fn dispose(&self) {
        let ids = std::mem::take(&mut *self.ids.borrow_mut());
        for id in ids {
            self.scheduler.cancel(id);
        }
    }
}

/// Re-emits every value `duration` later.
///
/// Completion is delayed by the same amount so it never overtakes pending
/// values. Errors are forwarded immediately. Disposing the output cancels
/// every pending emission.
#[must_use]
pub fn delay<T, S>(scheduler: S, duration: Duration) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Clone + 'static,
    S: Scheduler + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let timers = Rc::new(PendingTimers {
                scheduler,
                ids: RefCell::new(HashSet::new()),
            });

            let on_value = Rc::clone(&timers);
            let on_complete = Rc::clone(&timers);
            let (next, error, complete) = (source.clone(), source.clone(), source);
            let subscription = stream.subscribe(
                Listeners::new()
                    .on_next(move |value: &T| {
                        let target = next.clone();
                        let value = value.clone();
                        on_value.schedule(duration, move || target.emit(value));
                    })
                    .on_error(move |err| error.emit_error(err.clone()))
                    .on_complete(move || {
                        let target = complete.clone();
                        on_complete.schedule(duration, move || target.emit_complete());
                    }),
            );

            let teardown = CompositeDisposable::new();
            teardown.insert(subscription);
            teardown.add(timers);
            teardown
        })
    }
}

/// Forwards a value once the window opened for it closes.
///
/// Every upstream value cancels the pending window and opens a new one by
/// subscribing to `duration(&value)`. The window's first event, be it a
/// value, an error or completion, releases the value exactly once. Values
/// superseded before their window closes are dropped.
#[must_use]
pub fn throttle<T, D, F>(duration: F) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Clone + 'static,
    D: 'static,
    F: Fn(&T) -> Stream<D> + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let window = CompositeDisposable::new();
            let current = window.clone();
            let target = source.clone();
            let upstream = stream.subscribe(Listeners::relay(&source).on_next(move |value: &T| {
                current.dispose();

                let fired = Rc::new(Cell::new(false));
                let release: Rc<dyn Fn()> = {
                    let fired = Rc::clone(&fired);
                    let window = current.clone();
                    let target = target.clone();
                    let value = value.clone();
                    Rc::new(move || {
                        if fired.replace(true) {
                            return;
                        }
                        window.dispose();
                        target.emit_ref(&value);
                    })
                };

                let (on_tick, on_error, on_done) = (Rc::clone(&release), Rc::clone(&release), release);
                let subscription = duration(value).subscribe(
                    Listeners::new()
                        .on_next(move |_: &D| on_tick())
                        .on_error(move |_| on_error())
                        .on_complete(move || on_done()),
                );
                // Closed synchronously while subscribing.
                if fired.get() {
                    subscription.dispose();
                } else {
                    current.insert(subscription);
                }
            }));

            let teardown = CompositeDisposable::new();
            teardown.insert(upstream);
            teardown.insert(window);
            teardown
        })
    }
}

/// Throttles against a shared tick stream of `period`.
///
/// One `interval` is started per activation, on the first upstream value,
/// and disposed with the output.
#[must_use]
pub fn throttle_time<T, S>(scheduler: S, period: Duration) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: Clone + 'static,
    S: Scheduler + 'static,
{
    move |stream: Stream<T>| {
        Stream::new(move |source: Source<T>| {
            let ticks = interval(scheduler, period);
            let window = ticks.clone();
            let throttled = stream.pipe(throttle(move |_: &T| window.clone()));
            throttled.forward_to(&source);

            let teardown = CompositeDisposable::new();
            teardown.insert(throttled);
            teardown.insert(ticks);
            teardown
        })
    }
}
