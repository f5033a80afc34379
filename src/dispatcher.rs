//! The Dispatcher (§4.1, §4.7): a pure decision function
//! over scheduler state, invoked at every scheduler-visible event.
//!
//! ```text
//!          fork
//!  [none] ─────► READY ──pop──► RUNNING ──body-return──► TERMINATED
//!                 ▲              │  │
//!                 │quantum=0     │  │ wait(e)
//!                 └──preempt─────┘  ▼
//!                         higher-pri   WAITING(e)
//!                         arrives ↑         │ signal(e)
//!                                 └─────────┘
//! ```
//!
//! Every function here takes `&mut SchedulerState` and returns a
//! [`Decision`] describing the hand-off (if any) the caller must carry out.
//! No gate is touched in this module: the Rendezvous protocol (`gate.rs`,
//! `scheduler.rs`) is the only code allowed to block a thread, which keeps
//! the scheduling *decision* testable without spinning up real OS threads.
use crate::registry::Registry;
use crate::task::{EventId, Priority, TaskId};
use crate::{ready_queue::ReadyQueue, wait_set::WaitSet};

pub(crate) struct SchedulerState {
    pub registry: Registry,
    pub ready: ReadyQueue,
    pub wait_set: WaitSet,
    pub running: Option<(TaskId, Priority)>,
    pub quantum: u32,
    pub io: u32,
    /// Every task ever forked, in creation order, for the Lifecycle
    /// Controller's join loop at `end()` (`so_scheduler.pthreads_created` in
    /// the reference).
    pub created_order: Vec<TaskId>,
}

impl SchedulerState {
    pub fn new(quantum: u32, io: u32) -> Self {
        Self {
            registry: Registry::new(),
            ready: ReadyQueue::new(),
            wait_set: WaitSet::new(),
            running: None,
            quantum,
            io,
            created_order: Vec::new(),
        }
    }
}

/// What the caller must do after a Dispatcher hook returns.
pub(crate) enum Decision {
    /// The previously running task (if any) keeps running; no gate is
    /// touched.
    Continue,
    /// Open `to`'s gate. If `from` is `Some`, the calling thread is that
    /// task and must then block on its own gate. If `from` is `None`, the
    /// calling context is not itself a scheduled task (the bootstrap forker,
    /// or a task whose body just returned) and does not block.
    HandOff { from: Option<TaskId>, to: TaskId },
    /// `wait()` found no runnable successor: per §5/§9, this is a
    /// programmer error and the reference's behaviour (block forever) is
    /// authoritative. `from` is the task that must block on its own gate,
    /// which nothing will ever open.
    Block { from: TaskId },
}

fn set_running(state: &mut SchedulerState, id: TaskId) {
    let tcb = state.registry.lookup(id);
    let priority = tcb.priority;
    tcb.remaining_quantum.set(state.quantum);
    state.running = Some((id, priority));
}

fn tick(state: &mut SchedulerState, id: TaskId) {
    let tcb = state.registry.lookup(id);
    let remaining = tcb.remaining_quantum.get();
    tcb.remaining_quantum.set(remaining.saturating_sub(1));
}

/// The core decision rule (§4.1 "reschedule"), given that `r_id`/`r_prio`
/// identify the currently running task.
fn reschedule(state: &mut SchedulerState, r_id: TaskId, r_prio: Priority) -> Decision {
    let quantum_left = state.registry.lookup(r_id).remaining_quantum.get();
    if quantum_left == 0 {
        state.ready.push(r_id, r_prio);
        let (h_id, _) = state
            .ready
            .pop()
            .expect("ready queue cannot be empty immediately after a push");
        set_running(state, h_id);
        log::trace!("quantum expired for {r_id:?}, dispatching {h_id:?}");
        Decision::HandOff {
            from: Some(r_id),
            to: h_id,
        }
    } else if let Some((h_id, h_prio)) = state.ready.peek() {
        if h_prio > r_prio {
            state.ready.pop();
            state.ready.push(r_id, r_prio);
            set_running(state, h_id);
            log::trace!("{h_id:?} (prio {h_prio}) preempts {r_id:?} (prio {r_prio})");
            Decision::HandOff {
                from: Some(r_id),
                to: h_id,
            }
        } else {
            Decision::Continue
        }
    } else {
        Decision::Continue
    }
}

/// `fork` hook (§4.1, §4.6). `new_id` must already be in the Ready Queue.
pub(crate) fn on_fork(state: &mut SchedulerState, new_id: TaskId) -> Decision {
    match state.running {
        None => {
            // Bootstrap: the forker is not a scheduled task, so it never
            // blocks; it simply promotes the new task and returns.
            let (id, _) = state
                .ready
                .pop()
                .expect("the task just forked must be in the ready queue");
            debug_assert_eq!(id, new_id);
            set_running(state, id);
            log::trace!("bootstrap fork: promoting {id:?} directly");
            Decision::HandOff {
                from: None,
                to: id,
            }
        }
        Some((r_id, r_prio)) => {
            // §4.1's decision rule calls `reschedule` directly here with no
            // quantum tick. (The reference C implementation's `so_fork` does
            // additionally decrement the running thread's quantum on every
            // non-bootstrap fork — see DESIGN.md — but doing so here would
            // contradict the quantum-preemption trace in §8 scenario S2,
            // which this crate treats as authoritative.)
            reschedule(state, r_id, r_prio)
        }
    }
}

/// `exec` hook (§4.1, §4.6). No-op if nothing is running.
pub(crate) fn on_exec(state: &mut SchedulerState) -> Decision {
    match state.running {
        None => Decision::Continue,
        Some((r_id, r_prio)) => {
            tick(state, r_id);
            reschedule(state, r_id, r_prio)
        }
    }
}

/// `wait` hook (§4.1, §4.6). Caller must have already checked that a task is
/// running and that `event < io`.
pub(crate) fn on_wait(state: &mut SchedulerState, event: EventId) -> Decision {
    let (r_id, r_prio) = state.running.take().expect("wait requires a running task");
    state.wait_set.insert(r_id, r_prio, event);
    log::trace!("{r_id:?} waits on event {event}");
    match state.ready.pop() {
        Some((h_id, _)) => {
            set_running(state, h_id);
            Decision::HandOff {
                from: Some(r_id),
                to: h_id,
            }
        }
        None => {
            log::trace!("{r_id:?} waits with no runnable successor; this will deadlock");
            Decision::Block { from: r_id }
        }
    }
}

/// `signal` hook (§4.1, §4.6). Returns the Decision plus the number of
/// tasks drained from the Wait Set. Caller must have already checked that a
/// task is running, `event < io`, and the Wait Set is non-empty (otherwise
/// this is a no-op returning 0, handled by the caller).
pub(crate) fn on_signal(state: &mut SchedulerState, event: EventId) -> (Decision, usize) {
    let (r_id, r_prio) = state
        .running
        .expect("signal requires a running task");
    state.ready.push(r_id, r_prio);

    let drained = state.wait_set.drain(event);
    let count = drained.len();
    for (id, prio) in drained {
        state.ready.push(id, prio);
    }

    let (h_id, _) = state
        .ready
        .pop()
        .expect("ready queue cannot be empty: the running task was just enqueued");
    set_running(state, h_id);
    log::trace!("signal({event}) woke {count} task(s), dispatching {h_id:?}");
    (
        Decision::HandOff {
            from: Some(r_id),
            to: h_id,
        },
        count,
    )
}

/// Task-completion hook (§4.1, §4.5 "Body entry protocol"). The terminating
/// task never waits on its own gate again, so `from` is always `None`.
pub(crate) fn on_terminate(state: &mut SchedulerState) -> Decision {
    match state.ready.pop() {
        Some((h_id, _)) => {
            set_running(state, h_id);
            log::trace!("task completed, dispatching {h_id:?}");
            Decision::HandOff {
                from: None,
                to: h_id,
            }
        }
        None => {
            state.running = None;
            log::trace!("task completed, scheduler is quiescent");
            Decision::Continue
        }
    }
}
