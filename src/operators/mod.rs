//! Stream operators.
//!
//! Every operator is a configuration function returning a closure
//! `FnOnce(Stream<T>) -> Stream<U>`, which is an [`Operator`](crate::stream::Operator)
//! and can be passed to [`Stream::pipe`](crate::stream::Stream::pipe) alone
//! or in a tuple:
//!
//! ```rust,ignore
//! let totals = clicks.pipe((filter(|c: &Click| c.primary), map(|_| 1), scan(|a, b, _| a + b)));
//! ```
//!
//! The returned stream is lazy. On activation it subscribes upstream and
//! its teardown releases that subscription together with any timers or
//! inner streams the operator owns.

/// Operators that combine a stream with other streams.
pub mod combine;
/// Operators that cut a stream short.
pub mod limit;
/// Operators driven by a [`Scheduler`](crate::scheduler::Scheduler).
pub mod time;
/// Value-by-value transformations.
pub mod transform;

pub use combine::{combine_latest_with, combine_latest_with_all, merge_with, start_with};
pub use limit::{take, take_while};
pub use time::{delay, throttle, throttle_time};
pub use transform::{filter, flat_map, map, scan, scan_seeded};
