//! Timer capability consumed by the time-based operators.
//!
//! The engine never reads a clock itself. `delay`, `throttle_time` and
//! `interval` go through a [`Scheduler`], and the host decides what time is.
//! [`ManualScheduler`] is a virtual clock advanced explicitly by the host,
//! which is what a single-threaded event loop or a test wants.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{trace, warn};

/// Handle for one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Deferred execution of callbacks.
///
/// A task scheduled with `delay` runs no earlier than `delay` from now,
/// at most once, unless cancelled first.
pub trait Scheduler {
    /// Runs `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId;

    /// Runs `task` every `period` until cancelled.
    fn schedule_repeating(&self, period: Duration, task: Rc<dyn Fn()>) -> TimerId;

    /// Cancels a pending task. Unknown or finished ids are ignored.
    fn cancel(&self, id: TimerId);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        (**self).schedule(delay, task)
    }

    fn schedule_repeating(&self, period: Duration, task: Rc<dyn Fn()>) -> TimerId {
        (**self).schedule_repeating(period, task)
    }

    fn cancel(&self, id: TimerId) {
        (**self).cancel(id);
    }
}

/// Limits for [`ManualScheduler`].
#[derive(Debug, Clone)]
pub struct ManualSchedulerConfig {
    /// Max tasks run by a single `advance_*` call before it gives up.
    pub max_runs_per_advance: usize,
    /// Repeating periods shorter than this are raised to it.
    pub min_repeat_period: Duration,
}

impl Default for ManualSchedulerConfig {
    fn default() -> Self {
        Self {
            max_runs_per_advance: 100_000,
            min_repeat_period: Duration::from_millis(1),
        }
    }
}

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeating { period: Duration, run: Rc<dyn Fn()> },
}

/// Queue position: deadline first, then scheduling order.
type Slot = (Duration, u64);

struct Entry {
    id: TimerId,
    task: Task,
}

struct SchedulerState {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<Slot, Entry>,
    /// Live timers. A repeating timer stays here while it runs.
    live: HashMap<TimerId, Slot>,
}

impl SchedulerState {
    fn enqueue(&mut self, id: TimerId, deadline: Duration, task: Task) {
        let slot = (deadline, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(slot, Entry { id, task });
        self.live.insert(id, slot);
    }

    fn allocate_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// A virtual-time scheduler driven by the host.
///
/// Time starts at zero and only moves through [`ManualScheduler::advance_by`]
/// and [`ManualScheduler::advance_to`]. Tasks due at the same instant run in
/// the order they were scheduled. Clones share the same clock and queue.
#[derive(Clone)]
pub struct ManualScheduler {
    state: Rc<RefCell<SchedulerState>>,
    config: ManualSchedulerConfig,
}

impl ManualScheduler {
    /// Creates a scheduler with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManualSchedulerConfig::default())
    }

    /// Creates a scheduler with explicit limits.
    #[must_use]
    pub fn with_config(config: ManualSchedulerConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SchedulerState {
                now: Duration::ZERO,
                next_id: 0,
                next_seq: 0,
                queue: BTreeMap::new(),
                live: HashMap::new(),
            })),
            config,
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Deadline of the earliest pending task.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Moves the clock forward by `step`, running every task that falls due.
    ///
    /// Returns the number of tasks run.
    pub fn advance_by(&self, step: Duration) -> usize {
        let target = self.now().saturating_add(step);
        self.advance_to(target)
    }

    /// Moves the clock to `target`, running every task due at or before it.
    ///
    /// Tasks scheduled by running tasks are picked up in the same call when
    /// they fall due before `target`. Moving backwards is a no-op.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut runs = 0;
        loop {
            if runs >= self.config.max_runs_per_advance {
                warn!(
                    runs,
                    max = self.config.max_runs_per_advance,
                    "scheduler run cap reached; remaining tasks deferred"
                );
                break;
            }
            let Some(entry) = self.pop_due(target) else {
                break;
            };
            runs += 1;
            trace!(timer_id = entry.id.0, "timer fired");
            match entry.task {
                Task::Once(task) => task(),
                Task::Repeating { period, run } => {
                    run();
                    self.reschedule(entry.id, period, run);
                }
            }
        }

        let mut state = self.state.borrow_mut();
        if target > state.now {
            state.now = target;
        }
        runs
    }

    fn pop_due(&self, target: Duration) -> Option<Entry> {
        let mut state = self.state.borrow_mut();
        let (&slot, _) = state.queue.iter().next()?;
        if slot.0 > target {
            return None;
        }
        let entry = state.queue.remove(&slot)?;
        if slot.0 > state.now {
            state.now = slot.0;
        }
        if matches!(entry.task, Task::Once(_)) {
            state.live.remove(&entry.id);
        }
        Some(entry)
    }

    fn reschedule(&self, id: TimerId, period: Duration, run: Rc<dyn Fn()>) {
        let mut state = self.state.borrow_mut();
        // Cancelled while running.
        if !state.live.contains_key(&id) {
            return;
        }
        let deadline = state.now.saturating_add(period);
        state.enqueue(id, deadline, Task::Repeating { period, run });
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        let deadline = state.now.saturating_add(delay);
        state.enqueue(id, deadline, Task::Once(task));
        trace!(timer_id = id.0, ?delay, "timer scheduled");
        id
    }

    fn schedule_repeating(&self, period: Duration, task: Rc<dyn Fn()>) -> TimerId {
        let period = period.max(self.config.min_repeat_period);
        let mut state = self.state.borrow_mut();
        let id = state.allocate_id();
        let deadline = state.now.saturating_add(period);
        state.enqueue(id, deadline, Task::Repeating { period, run: task });
        trace!(timer_id = id.0, ?period, "repeating timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        if let Some(slot) = state.live.remove(&id) {
            state.queue.remove(&slot);
            trace!(timer_id = id.0, "timer cancelled");
        }
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .field("config", &self.config)
            .finish()
    }
}
