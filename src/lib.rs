//! # KyroStream - Push-based Reactive Streams
//!
//! KyroStream is a small, synchronous reactive-stream engine. A [`Stream`]
//! activates its producer lazily on the first subscription and multicasts
//! every value, error and completion to all of its subscribers, in
//! registration order, on the emitting call stack.
//!
//! ## Core Concepts
//!
//! - **Stream**: a lazily activated, shared (hot) sequence of values
//! - **Distributor**: the multicast hub behind a live stream
//! - **Subscription**: a disposable handle for one listener registration
//! - **Operator**: a function `Stream<T> -> Stream<U>`, chained with [`Stream::pipe`]
//! - **ConsciousStream**: a stream wrapper that remembers its last value and error
//! - **MessageStream**: tagged messages split into an input and a per-tag output
//! - **ActionEventStream**: a two-sided typed channel between a caller and a handler
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kyrostream::operators::{filter, map, scan_seeded};
//! use kyrostream::{of, Stream};
//!
//! let totals: Stream<i32> = of([1, 2, 3, 4]).pipe((
//!     filter(|v: &i32| v % 2 == 0),
//!     map(|v: &i32| v * 10),
//!     scan_seeded(|acc: &i32, v: &i32, _| acc + v, 0),
//! ));
//!
//! totals.subscribe_next(|total| println!("{total}"));
//! // 0, 20, 60
//! ```
//!
//! Everything here is single-threaded: handles are `Rc`-based and `!Send`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod disposable;
pub mod error;
pub mod maybe;
pub mod stream;

// Construction and composition
pub mod constructors;
pub mod operators;
pub mod scheduler;

// Typed channels
pub mod action_event;
pub mod message;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export primary types at crate root for convenience
pub use disposable::{CompositeDisposable, Disposable, DisposeAction, Teardown};
pub use error::{CodecError, CodecResult, MaybeError, MaybeResult, StreamError};
pub use maybe::Maybe;
pub use stream::{
    ConsciousStream, Distributor, ListenerId, Listeners, Operator, Source, StartingValues, Stream,
    Subscription,
};

pub use action_event::{ActionEventInternalView, ActionEventPublicView, ActionEventStream};
pub use constructors::{
    combine_latest2, combine_latest3, combine_latest_all, from_iter, interval, merge, of, range,
};
pub use message::{Message, MessageStream, MessageStreamInput, MessageStreamOutput, TaggedMessage};
pub use scheduler::{ManualScheduler, ManualSchedulerConfig, Scheduler, TimerId};
