//! Functions that build streams from scratch or from several inputs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::disposable::{CompositeDisposable, DisposeAction, Teardown};
use crate::scheduler::Scheduler;
use crate::stream::{Listeners, Source, Stream, Subscription};

/// A stream that emits `values` in order, then completes.
#[must_use]
pub fn of<T: 'static, const N: usize>(values: [T; N]) -> Stream<T> {
    from_iter(values)
}

/// A stream that emits every item of `values` in order, then completes.
///
/// The iterator is consumed on activation.
#[must_use]
pub fn from_iter<I>(values: I) -> Stream<I::Item>
where
    I: IntoIterator + 'static,
    I::Item: 'static,
{
    Stream::new(move |source: Source<I::Item>| {
        for value in values {
            source.emit(value);
        }
        source.emit_complete();
    })
}

/// A stream of `0..length`, then completion.
#[must_use]
pub fn range(length: usize) -> Stream<usize> {
    from_iter(0..length)
}

/// A stream of tick numbers `0, 1, 2, ...`, one every `period`.
///
/// The repeating timer is cancelled when the stream is disposed.
#[must_use]
pub fn interval<S>(scheduler: S, period: Duration) -> Stream<u64>
where
    S: Scheduler + 'static,
{
    Stream::new(move |source: Source<u64>| {
        let ticks = Cell::new(0u64);
        let timer = scheduler.schedule_repeating(
            period,
            Rc::new(move || {
                let tick = ticks.get();
                ticks.set(tick + 1);
                source.emit(tick);
            }),
        );
        DisposeAction::new(move || scheduler.cancel(timer))
    })
}

/// Interleaves every input into one stream.
///
/// Errors from any input are forwarded. The merged stream completes once all
/// inputs have completed; with no inputs it completes on activation.
#[must_use]
pub fn merge<T: 'static>(streams: Vec<Stream<T>>) -> Stream<T> {
    Stream::new(move |source: Source<T>| -> Teardown {
        if streams.is_empty() {
            source.emit_complete();
            return Teardown::None;
        }

        let remaining = Rc::new(Cell::new(streams.len()));
        let count_down = {
            let source = source.clone();
            move || {
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                if left == 0 {
                    source.emit_complete();
                }
            }
        };
        let count_down = Rc::new(count_down);

        let subscriptions = CompositeDisposable::new();
        for stream in &streams {
            let next = source.clone();
            let error = source.clone();
            let done = Rc::clone(&count_down);
            let subscription = stream.subscribe(
                Listeners::new()
                    .on_next(move |value: &T| next.emit_ref(value))
                    .on_error(move |err| error.emit_error(err.clone()))
                    .on_complete(move || done()),
            );
            // Already finished inputs count as completed.
            if subscription.is_null() {
                count_down();
            }
            subscriptions.insert(subscription);
        }
        subscriptions.into()
    })
}

/// Pairs the latest values of two streams.
///
/// Nothing is emitted until both have emitted once; after that every value
/// from either side emits a fresh pair.
#[must_use]
pub fn combine_latest2<A, B>(first: Stream<A>, second: Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    Stream::new(move |source: Source<(A, B)>| {
        let gate = LatestGate::shared(2);
        let slot_a = Rc::new(RefCell::new(None));
        let slot_b = Rc::new(RefCell::new(None));

        let emit_latest: Rc<dyn Fn()> = {
            let (slot_a, slot_b, source) = (Rc::clone(&slot_a), Rc::clone(&slot_b), source.clone());
            Rc::new(move || {
                let a = slot_a.borrow().clone();
                let b = slot_b.borrow().clone();
                if let (Some(a), Some(b)) = (a, b) {
                    source.emit((a, b));
                }
            })
        };

        let subscriptions = CompositeDisposable::new();
        subscriptions.insert(attach_latest(&first, 0, slot_a, &gate, &emit_latest, &source));
        subscriptions.insert(attach_latest(&second, 1, slot_b, &gate, &emit_latest, &source));
        subscriptions
    })
}

/// Triples the latest values of three streams.
#[must_use]
pub fn combine_latest3<A, B, C>(
    first: Stream<A>,
    second: Stream<B>,
    third: Stream<C>,
) -> Stream<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    Stream::new(move |source: Source<(A, B, C)>| {
        let gate = LatestGate::shared(3);
        let slot_a = Rc::new(RefCell::new(None));
        let slot_b = Rc::new(RefCell::new(None));
        let slot_c = Rc::new(RefCell::new(None));

        let emit_latest: Rc<dyn Fn()> = {
            let slots = (Rc::clone(&slot_a), Rc::clone(&slot_b), Rc::clone(&slot_c));
            let source = source.clone();
            Rc::new(move || {
                let a = slots.0.borrow().clone();
                let b = slots.1.borrow().clone();
                let c = slots.2.borrow().clone();
                if let (Some(a), Some(b), Some(c)) = (a, b, c) {
                    source.emit((a, b, c));
                }
            })
        };

        let subscriptions = CompositeDisposable::new();
        subscriptions.insert(attach_latest(&first, 0, slot_a, &gate, &emit_latest, &source));
        subscriptions.insert(attach_latest(&second, 1, slot_b, &gate, &emit_latest, &source));
        subscriptions.insert(attach_latest(&third, 2, slot_c, &gate, &emit_latest, &source));
        subscriptions
    })
}

/// Combines the latest values of any number of same-typed streams.
///
/// With no inputs the stream completes on activation.
#[must_use]
pub fn combine_latest_all<T: Clone + 'static>(streams: Vec<Stream<T>>) -> Stream<Vec<T>> {
    Stream::new(move |source: Source<Vec<T>>| -> Teardown {
        if streams.is_empty() {
            source.emit_complete();
            return Teardown::None;
        }

        let gate = LatestGate::shared(streams.len());
        let slots: Vec<Rc<RefCell<Option<T>>>> =
            streams.iter().map(|_| Rc::new(RefCell::new(None))).collect();

        let emit_latest: Rc<dyn Fn()> = {
            let slots = slots.clone();
            let source = source.clone();
            Rc::new(move || {
                let latest: Option<Vec<T>> = slots.iter().map(|slot| slot.borrow().clone()).collect();
                if let Some(latest) = latest {
                    source.emit(latest);
                }
            })
        };

        let subscriptions = CompositeDisposable::new();
        for (index, (stream, slot)) in streams.iter().zip(slots).enumerate() {
            subscriptions.insert(attach_latest(stream, index, slot, &gate, &emit_latest, &source));
        }
        subscriptions.into()
    })
}

/// Bookkeeping shared by the inputs of one combine-latest activation.
struct LatestGate {
    received: Vec<bool>,
    received_count: usize,
    completed: usize,
}

impl LatestGate {
    fn shared(inputs: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            received: vec![false; inputs],
            received_count: 0,
            completed: 0,
        }))
    }

    /// Records a value from `index`; returns true once every input has one.
    fn mark_received(&mut self, index: usize) -> bool {
        if !self.received[index] {
            self.received[index] = true;
            self.received_count += 1;
        }
        self.received_count == self.received.len()
    }

    /// Records completion of `index`; returns true if the output should complete.
    fn mark_completed(&mut self, index: usize) -> bool {
        self.completed += 1;
        self.completed >= self.received.len() || !self.received[index]
    }
}

fn attach_latest<X, O>(
    stream: &Stream<X>,
    index: usize,
    slot: Rc<RefCell<Option<X>>>,
    gate: &Rc<RefCell<LatestGate>>,
    emit_latest: &Rc<dyn Fn()>,
    output: &Source<O>,
) -> Subscription
where
    X: Clone + 'static,
    O: 'static,
{
    let complete_input: Rc<dyn Fn()> = {
        let gate = Rc::clone(gate);
        let output = output.clone();
        Rc::new(move || {
            let done = gate.borrow_mut().mark_completed(index);
            if done {
                output.emit_complete();
            }
        })
    };

    let next_gate = Rc::clone(gate);
    let emit_latest = Rc::clone(emit_latest);
    let error = output.clone();
    let done = Rc::clone(&complete_input);
    let subscription = stream.subscribe(
        Listeners::new()
            .on_next(move |value: &X| {
                *slot.borrow_mut() = Some(value.clone());
                let ready = next_gate.borrow_mut().mark_received(index);
                if ready {
                    emit_latest();
                }
            })
            .on_error(move |err| error.emit_error(err.clone()))
            .on_complete(move || done()),
    );
    if subscription.is_null() {
        complete_input();
    }
    subscription
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::scheduler::ManualScheduler;
    use crate::stream::Distributor;
    use crate::testing::{Notification, Recorder};

    fn live<T: 'static>() -> (Source<T>, Stream<T>) {
        let source = Source::new(Distributor::new());
        (source.clone(), Stream::live(source))
    }

    #[test]
    fn test_of_emits_then_completes() {
        let recorder = Recorder::attach(&of([1, 2, 3]));
        assert_eq!(recorder.values(), vec![1, 2, 3]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn test_range_counts_from_zero() {
        let recorder = Recorder::attach(&range(4));
        assert_eq!(recorder.values(), vec![0, 1, 2, 3]);
        assert!(Recorder::attach(&range(0)).is_completed());
    }

    #[test]
    fn test_interval_ticks_until_disposed() {
        let scheduler = ManualScheduler::new();
        let ticks = interval(scheduler.clone(), Duration::from_millis(10));
        let recorder = Recorder::attach(&ticks);

        scheduler.advance_by(Duration::from_millis(35));
        assert_eq!(recorder.values(), vec![0, 1, 2]);

        ticks.dispose();
        assert_eq!(scheduler.pending(), 0);
        scheduler.advance_by(Duration::from_millis(50));
        assert_eq!(recorder.values(), vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_completes_after_all_inputs() {
        let (a_source, a) = live::<i32>();
        let (b_source, b) = live::<i32>();
        let recorder = Recorder::attach(&merge(vec![a, b]));

        a_source.emit(1);
        b_source.emit(2);
        a_source.emit_complete();
        assert!(!recorder.is_completed());
        b_source.emit(3);
        b_source.emit_complete();

        assert_eq!(recorder.values(), vec![1, 2, 3]);
        assert!(recorder.is_completed());
    }

    #[test]
    fn test_merge_forwards_errors_and_handles_finished_inputs() {
        let (source, open) = live::<i32>();
        let recorder = Recorder::attach(&merge(vec![of([7]), open]));
        source.emit_error(StreamError::msg("broken"));
        source.emit_complete();

        assert_eq!(
            recorder.notifications(),
            vec![
                Notification::Next(7),
                Notification::Error("broken".to_string()),
                Notification::Complete,
            ]
        );
    }

    #[test]
    fn test_merge_of_nothing_completes() {
        assert!(Recorder::attach(&merge(Vec::<Stream<u8>>::new())).is_completed());
    }

    #[test]
    fn test_combine_latest2_waits_for_both() {
        let (a_source, a) = live::<i32>();
        let (b_source, b) = live::<char>();
        let recorder = Recorder::attach(&combine_latest2(a, b));

        a_source.emit(1);
        assert!(recorder.values().is_empty());
        b_source.emit('x');
        a_source.emit(2);
        assert_eq!(recorder.values(), vec![(1, 'x'), (2, 'x')]);
    }

    #[test]
    fn test_combine_latest3() {
        let (a_source, a) = live::<i32>();
        let recorder = Recorder::attach(&combine_latest3(a, of(["b"]), of([true])));
        a_source.emit(5);
        assert_eq!(recorder.values(), vec![(5, "b", true)]);
    }

    #[test]
    fn test_combine_latest_completes_when_input_ends_empty() {
        let (_keep, open) = live::<i32>();
        let recorder = Recorder::attach(&combine_latest_all(vec![open, of([])]));
        assert!(recorder.values().is_empty());
        assert!(recorder.is_completed());
    }

    #[test]
    fn test_combine_latest_all_and_empty_input() {
        let (a_source, a) = live::<i32>();
        let (b_source, b) = live::<i32>();
        let recorder = Recorder::attach(&combine_latest_all(vec![a, b]));
        a_source.emit(1);
        b_source.emit(2);
        b_source.emit(3);
        a_source.emit_complete();
        assert!(!recorder.is_completed());
        b_source.emit_complete();

        assert_eq!(recorder.values(), vec![vec![1, 2], vec![1, 3]]);
        assert!(recorder.is_completed());
        assert!(Recorder::attach(&combine_latest_all(Vec::<Stream<i32>>::new())).is_completed());
    }
}
