use crate::constructors::{combine_latest2, combine_latest_all, from_iter, merge};
use crate::stream::Stream;

/// Emits `values` first, then everything the stream emits.
#[must_use]
pub fn start_with<T, I>(values: I) -> impl FnOnce(Stream<T>) -> Stream<T>
where
    T: 'static,
    I: IntoIterator<Item = T> + 'static,
{
    move |stream: Stream<T>| merge(vec![from_iter(values), stream])
}

/// Interleaves the stream with `others`.
///
/// Completes once the stream and every other input have completed.
#[must_use]
pub fn merge_with<T: 'static>(others: Vec<Stream<T>>) -> impl FnOnce(Stream<T>) -> Stream<T> {
    move |stream: Stream<T>| {
        let mut inputs = Vec::with_capacity(others.len() + 1);
        inputs.push(stream);
        inputs.extend(others);
        merge(inputs)
    }
}

/// Pairs every value with the latest value of `other`.
#[must_use]
pub fn combine_latest_with<T, U>(other: Stream<U>) -> impl FnOnce(Stream<T>) -> Stream<(T, U)>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    move |stream: Stream<T>| combine_latest2(stream, other)
}

/// Combines the stream with any number of same-typed streams.
///
/// The stream's own value comes first in every emitted vector.
#[must_use]
pub fn combine_latest_with_all<T>(others: Vec<Stream<T>>) -> impl FnOnce(Stream<T>) -> Stream<Vec<T>>
where
    T: Clone + 'static,
{
    move |stream: Stream<T>| {
        let mut inputs = Vec::with_capacity(others.len() + 1);
        inputs.push(stream);
        inputs.extend(others);
        combine_latest_all(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructors::of;
    use crate::stream::{Distributor, Source};
    use crate::testing::Recorder;

    fn live<T: 'static>() -> (Source<T>, Stream<T>) {
        let source = Source::new(Distributor::new());
        (source.clone(), Stream::live(source))
    }

    #[test]
    fn test_start_with_prepends_values() {
        let (source, upstream) = live::<&str>();
        let recorder = Recorder::attach(&upstream.pipe(start_with(["a", "b"])));
        source.emit("c");
        assert_eq!(recorder.values(), vec!["a", "b", "c"]);
        assert!(!recorder.is_completed());

        source.emit_complete();
        assert!(recorder.is_completed());
    }

    #[test]
    fn test_merge_with_interleaves() {
        let (a_source, a) = live::<i32>();
        let (b_source, b) = live::<i32>();
        let recorder = Recorder::attach(&a.pipe(merge_with(vec![b, of([0])])));
        a_source.emit(1);
        b_source.emit(2);
        a_source.emit(3);
        assert_eq!(recorder.values(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_combine_latest_with_pairs() {
        let (a_source, a) = live::<i32>();
        let (b_source, b) = live::<char>();
        let recorder = Recorder::attach(&a.pipe(combine_latest_with(b)));
        a_source.emit(1);
        b_source.emit('x');
        a_source.emit(2);
        b_source.emit('y');
        assert_eq!(recorder.values(), vec![(1, 'x'), (2, 'x'), (2, 'y')]);
    }

    #[test]
    fn test_combine_latest_with_all_orders_self_first() {
        let (a_source, a) = live::<i32>();
        let recorder = Recorder::attach(&a.pipe(combine_latest_with_all(vec![of([10]), of([20])])));
        a_source.emit(1);
        assert_eq!(recorder.values(), vec![vec![1, 10, 20]]);
    }
}
