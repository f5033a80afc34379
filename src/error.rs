use std::fmt;

/// Validation failures returned by the public API.
///
/// These are the only errors this crate ever returns to a caller; every
/// other failure mode named in the design (TCB allocation, thread creation,
/// gate creation, an unexpected wakeup from the synchronisation primitive) is
/// treated as unrecoverable and panics instead, since the scheduler cannot
/// guarantee its invariants once one of those happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// `init` was called while a scheduler instance is already active.
    AlreadyInitialized,
    /// An API function other than `init` was called with no active scheduler.
    NotInitialized,
    /// `init` was called with a zero time quantum.
    InvalidQuantum,
    /// `init`'s `io` parameter exceeds [`crate::MAX_NUM_EVENTS`].
    TooManyEvents,
    /// `fork`'s priority parameter exceeds [`crate::MAX_PRIO`].
    InvalidPriority,
    /// `wait`/`signal` were given an event id outside `0..io`.
    EventOutOfRange,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AlreadyInitialized => "scheduler is already initialized",
            Self::NotInitialized => "scheduler has not been initialized",
            Self::InvalidQuantum => "time quantum must be greater than zero",
            Self::TooManyEvents => "io exceeds MAX_NUM_EVENTS",
            Self::InvalidPriority => "priority exceeds MAX_PRIO",
            Self::EventOutOfRange => "event id is out of range for this scheduler instance",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for SchedulerError {}
