//! A cooperatively-emulated preemptive priority scheduler.
//!
//! Each scheduled task runs as a real OS thread, but exactly one task makes
//! forward progress at a time: the scheduler serialises execution with a
//! per-task binary gate (see [`gate`]) and only ever hands off from the
//! currently running task to the single next task a pure [`dispatcher`]
//! decides on. The result behaves like a single logical CPU running a
//! priority-preemptive, FIFO-within-priority scheduler, where "time" is
//! counted in scheduler-visible calls ([`exec`]) rather than wall-clock
//! ticks.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let log = Arc::new(std::sync::Mutex::new(Vec::new()));
//!
//! priosched::init(5, 1).unwrap();
//! let l = Arc::clone(&log);
//! priosched::fork(move |_prio| l.lock().unwrap().push("A"), 1).unwrap();
//! priosched::end();
//!
//! assert_eq!(*log.lock().unwrap(), vec!["A"]);
//! ```
mod dispatcher;
mod error;
mod gate;
mod ready_queue;
mod registry;
mod scheduler;
mod task;
mod wait_set;

pub use error::SchedulerError;
pub use task::{EventId, Priority, TaskId};

/// Upper bound (inclusive) on a task's priority.
///
/// Matches the reference implementation's documented default (§6).
pub const MAX_PRIO: Priority = 5;

/// Upper bound on the number of distinct event ids an `init`'d scheduler may
/// be configured with.
///
/// Matches the reference implementation's documented default (§6).
pub const MAX_NUM_EVENTS: EventId = 256;

/// Initialise the scheduler singleton.
///
/// `quantum` is the number of scheduler-visible operations ([`exec`], and
/// implicitly every [`fork`]) a task may perform before being preempted by a
/// ready task of equal priority; it must be nonzero. `io` is the number of
/// distinct event ids `wait`/`signal` will accept, `0..io`; it must not
/// exceed [`MAX_NUM_EVENTS`].
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidQuantum`] if `quantum == 0`,
/// [`SchedulerError::TooManyEvents`] if `io > MAX_NUM_EVENTS`, or
/// [`SchedulerError::AlreadyInitialized`] if a scheduler instance is already
/// active. A second successful `init` is never allowed: this call is
/// idempotent on failure, not on success.
pub fn init(quantum: u32, io: EventId) -> Result<(), SchedulerError> {
    scheduler::init(quantum, io)
}

/// Fork a new task running `body` at `priority`.
///
/// `body` receives its own priority as an argument, matching the
/// reference's `so_handler` signature. If no task is currently running (the
/// very first fork, or a fork issued after every previously forked task has
/// terminated), the calling context is not itself treated as a scheduled
/// task and does not block; otherwise the fork may preempt the caller if
/// `priority` is strictly greater, per the Dispatcher's decision rule.
///
/// Calling `fork` from outside any task body (including the bootstrap case
/// above) assumes the calling thread won't race the task it just released:
/// if that outer caller forks again, or the released task runs far enough
/// to call `exec`/`wait`/`signal` itself, before the OS has actually
/// scheduled the released task's first turn, the interleaving becomes
/// timing-dependent — the same racy bootstrap the reference implementation
/// has. Forking only from within a task body (the common case) has no such
/// race, since the Dispatcher lock serialises every call a task body makes
/// against the task's own prior progress.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidPriority`] if `priority > MAX_PRIO`, or
/// [`SchedulerError::NotInitialized`] if called before `init`.
pub fn fork(
    body: impl FnOnce(Priority) + Send + 'static,
    priority: Priority,
) -> Result<TaskId, SchedulerError> {
    scheduler::fork(Box::new(body), priority)
}

/// Simulate the execution of one instruction in the calling task's time
/// slice, decrementing its remaining quantum and rescheduling if it has
/// expired or a higher-priority task has become ready.
///
/// A no-op if no task is currently running, or if called before `init`.
pub fn exec() {
    scheduler::exec();
}

/// Block the calling task until [`signal`] is called for `event`.
///
/// A no-op returning `Ok(())` if no task is currently running. Blocking
/// indefinitely if the Ready Queue is empty at the point of the call is by
/// design (§5, §9): the scheduler assumes at least one other runnable task
/// exists whenever the running task yields.
///
/// # Errors
///
/// Returns [`SchedulerError::EventOutOfRange`] if `event >= io` (the value
/// passed to `init`), or [`SchedulerError::NotInitialized`] before `init`.
pub fn wait(event: EventId) -> Result<(), SchedulerError> {
    scheduler::wait(event)
}

/// Move every task waiting on `event` back to the Ready Queue, then
/// reschedule. Returns the number of tasks moved.
///
/// A no-op returning `Ok(0)` if no task is currently running. Note that a
/// woken task of higher priority than the caller will preempt it: calling
/// `signal` does not guarantee the caller remains running.
///
/// # Errors
///
/// Returns [`SchedulerError::EventOutOfRange`] if `event >= io`, or
/// [`SchedulerError::NotInitialized`] before `init`.
pub fn signal(event: EventId) -> Result<usize, SchedulerError> {
    scheduler::signal(event)
}

/// Join every task ever forked, in creation order, then tear down the
/// scheduler singleton so a later `init` is legal again.
pub fn end() {
    scheduler::end();
}
