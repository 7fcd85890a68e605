use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use kyrostream::operators::{
    combine_latest_with, delay, filter, flat_map, map, merge_with, scan, scan_seeded, start_with,
    take, take_while, throttle_time,
};
use kyrostream::testing::{Notification, Recorder};
use kyrostream::{
    combine_latest2, combine_latest_all, interval, merge, of, range, Distributor, ManualScheduler,
    Source, Stream, StreamError,
};

fn live<T: 'static>() -> (Source<T>, Stream<T>) {
    let source = Source::new(Distributor::new());
    (source.clone(), Stream::live(source))
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn scan_with_and_without_seed() {
    let seeded = Recorder::attach(&of([1, 2, 3]).pipe(scan_seeded(|acc: &i32, v: &i32, _| acc + v, 0)));
    let unseeded = Recorder::attach(&of([1, 2, 3]).pipe(scan(|acc: &i32, v: &i32, _| acc + v)));

    assert_eq!(seeded.values(), vec![0, 1, 3, 6]);
    assert_eq!(unseeded.values(), vec![1, 3, 6]);
}

#[test]
fn take_zero_never_starts_upstream() {
    let started = Rc::new(Cell::new(false));
    let s = Rc::clone(&started);
    let upstream = Stream::new(move |source: Source<i32>| {
        s.set(true);
        source.emit(1);
    });

    let recorder = Recorder::attach(&upstream.pipe(take(0)));
    assert_eq!(recorder.notifications(), vec![Notification::Complete]);
    assert!(!started.get());
}

#[test]
fn combine_latest_waits_for_every_input() {
    let (numbers, a) = live::<i32>();
    let (letters, b) = live::<char>();
    let recorder = Recorder::attach(&combine_latest2(a, b));

    numbers.emit(1);
    assert!(recorder.values().is_empty());
    letters.emit('x');
    numbers.emit(2);
    assert_eq!(recorder.values(), vec![(1, 'x'), (2, 'x')]);
}

#[test]
fn combine_latest_of_nothing_completes() {
    let recorder = Recorder::attach(&combine_latest_all(Vec::<Stream<u8>>::new()));
    assert_eq!(recorder.notifications(), vec![Notification::Complete]);
}

#[test]
fn merge_completes_when_all_inputs_complete() {
    let (first, a) = live::<i32>();
    let (second, b) = live::<i32>();
    let recorder = Recorder::attach(&merge(vec![a, b]));

    first.emit(1);
    first.emit_complete();
    second.emit(2);
    assert!(!recorder.is_completed());
    second.emit_complete();

    assert_eq!(
        recorder.notifications(),
        vec![Notification::Next(1), Notification::Next(2), Notification::Complete]
    );
}

#[test]
fn pipeline_of_several_operators() {
    let recorder = Recorder::attach(&range(10).pipe((
        filter(|v: &usize| v % 3 == 0),
        map(|v: &usize| v * 2),
        take_while(|v: &usize| *v < 15),
        start_with([100]),
    )));
    assert_eq!(recorder.values(), vec![100, 0, 6, 12]);
    assert!(recorder.is_completed());
}

#[test]
fn errors_pass_through_operators() {
    let (source, upstream) = live::<i32>();
    let recorder = Recorder::attach(&upstream.pipe((map(|v: &i32| v + 1), filter(|v: &i32| *v > 0), take(5))));
    source.emit_error(StreamError::msg("upstream failed"));
    source.emit(1);

    assert_eq!(recorder.errors(), vec!["upstream failed"]);
    assert_eq!(recorder.values(), vec![2]);
}

#[test]
fn merge_with_and_combine_latest_with() {
    let (source, upstream) = live::<i32>();
    let merged = Recorder::attach(&upstream.pipe(merge_with(vec![of([0])])));
    let paired = Recorder::attach(&upstream.pipe(combine_latest_with(of(["tag"]))));
    source.emit(7);

    assert_eq!(merged.values(), vec![0, 7]);
    assert_eq!(paired.values(), vec![(7, "tag")]);
}

#[test]
fn flat_map_flattens_inner_streams() {
    let recorder = Recorder::attach(&of([1usize, 2]).pipe(flat_map(|v: &usize| range(*v))));
    assert_eq!(recorder.values(), vec![0, 0, 1]);
}

#[test]
fn delay_and_interval_follow_the_scheduler() {
    let scheduler = ManualScheduler::new();
    let ticks = interval(scheduler.clone(), ms(10)).pipe((take(3), delay(scheduler.clone(), ms(5))));
    let recorder = Recorder::attach(&ticks);

    scheduler.advance_by(ms(14));
    assert!(recorder.values().is_empty());
    scheduler.advance_by(ms(1));
    assert_eq!(recorder.values(), vec![0]);

    scheduler.advance_by(ms(30));
    assert_eq!(recorder.values(), vec![0, 1, 2]);
    assert!(recorder.is_completed());
}

#[test]
fn throttle_time_emits_at_most_once_per_window() {
    let scheduler = ManualScheduler::new();
    let (source, upstream) = live::<&str>();
    let throttled = upstream.pipe(throttle_time(scheduler.clone(), ms(10)));
    let recorder = Recorder::attach(&throttled);

    source.emit("a");
    source.emit("b");
    source.emit("c");
    scheduler.advance_by(ms(10));
    scheduler.advance_by(ms(10));
    assert_eq!(recorder.values(), vec!["c"]);

    throttled.dispose();
    assert_eq!(scheduler.pending(), 0);
}
