//! Lifecycle Controller and Rendezvous orchestration (§4.5, §4.8).
//!
//! This module owns the single process-wide [`SchedulerState`] behind a
//! `Mutex`, the same discipline `r3_port_std::ums::ThreadGroup` uses for its
//! `Arc<threading::Mutex<State<Sched>>>`: lock, mutate, decide, unlock, then
//! perform any blocking outside the lock. No two hand-off steps ever run
//! concurrently because the lock serialises the *decision*, and at most one
//! task's gate is ever open at a time because of the Dispatcher's invariants.
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use once_cell::sync::OnceCell;

use crate::dispatcher::{self, Decision, SchedulerState};
use crate::error::SchedulerError;
use crate::gate::Gate;
use crate::task::{EventId, Priority, TaskBody, TaskId, Tcb};
use crate::{MAX_NUM_EVENTS, MAX_PRIO};

static SCHEDULER: OnceCell<Mutex<Option<SchedulerState>>> = OnceCell::new();

fn cell() -> &'static Mutex<Option<SchedulerState>> {
    SCHEDULER.get_or_init(|| Mutex::new(None))
}

fn lock() -> MutexGuard<'static, Option<SchedulerState>> {
    cell().lock().unwrap_or_else(|e| e.into_inner())
}

/// Turn a [`Decision`] into the actual Rendezvous steps (§4.5 "Hand-off"):
/// open the successor's gate while still holding the scheduler lock (opening
/// a gate never blocks), then, after releasing the lock, block on the
/// predecessor's gate if the calling context is itself a scheduled task.
///
/// `f` runs under the lock and returns the `Decision` plus any extra value
/// the caller needs (e.g. `signal`'s drained-waiter count).
fn dispatch<T>(f: impl FnOnce(&mut SchedulerState) -> (Decision, T)) -> T {
    let mut guard = lock();
    let state = guard.as_mut().expect("scheduler is not initialized");
    let (decision, value) = f(state);

    let wait_on: Option<Arc<Gate>> = match decision {
        Decision::Continue => None,
        Decision::HandOff { from, to } => {
            let to_gate = Arc::clone(&state.registry.lookup(to).gate);
            to_gate.open();
            from.map(|id| Arc::clone(&state.registry.lookup(id).gate))
        }
        Decision::Block { from } => Some(Arc::clone(&state.registry.lookup(from).gate)),
    };
    drop(guard);

    if let Some(gate) = wait_on {
        gate.wait();
    }
    value
}

fn dispatch_unit(f: impl FnOnce(&mut SchedulerState) -> Decision) {
    dispatch(|state| (f(state), ()))
}

/// §4.6 `init`.
pub(crate) fn init(quantum: u32, io: u32) -> Result<(), SchedulerError> {
    if quantum == 0 {
        return Err(SchedulerError::InvalidQuantum);
    }
    if io > MAX_NUM_EVENTS {
        return Err(SchedulerError::TooManyEvents);
    }
    let mut guard = lock();
    if guard.is_some() {
        return Err(SchedulerError::AlreadyInitialized);
    }
    log::debug!("scheduler initialized: quantum={quantum}, io={io}");
    *guard = Some(SchedulerState::new(quantum, io));
    Ok(())
}

/// Body-entry protocol (§4.5): block until released, run the user body,
/// then perform the task-completion hook and exit without ever blocking on
/// this thread's own gate again.
fn thread_entry(my_gate: Arc<Gate>, priority: Priority, body: TaskBody) {
    my_gate.wait();
    let result = catch_unwind(AssertUnwindSafe(|| body(priority)));
    dispatch_unit(dispatcher::on_terminate);
    if let Err(payload) = result {
        log::error!("a task panicked; propagating after releasing the next task");
        std::panic::resume_unwind(payload);
    }
}

/// §4.6 `fork`.
pub(crate) fn fork(body: TaskBody, priority: Priority) -> Result<TaskId, SchedulerError> {
    if priority > MAX_PRIO {
        return Err(SchedulerError::InvalidPriority);
    }

    let gate = Arc::new(Gate::new());
    let gate_for_thread = Arc::clone(&gate);

    let id = {
        let mut guard = lock();
        let state = guard.as_mut().ok_or(SchedulerError::NotInitialized)?;

        let tcb = Tcb::new_pending(priority, state.quantum, gate);
        let id = state.registry.insert(tcb);
        state.created_order.push(id);
        state.ready.push(id, priority);
        log::trace!("forked {id:?} at priority {priority}");

        let handle = thread::Builder::new()
            .name(format!("task-{}", id.0))
            .spawn(move || thread_entry(gate_for_thread, priority, body))
            .unwrap_or_else(|e| {
                log::error!("failed to spawn OS thread for {id:?}: {e}");
                panic!("failed to spawn OS thread for task: {e}");
            });
        state.registry.lookup_mut(id).set_join_handle(handle);
        id
    };

    dispatch_unit(|state| dispatcher::on_fork(state, id));
    Ok(id)
}

/// §4.6 `exec`. A no-op if the scheduler hasn't been `init`'d, or if nothing
/// is currently running, matching the reference's `so_exec`
/// (`if (!isAThreadRunning) return;`).
pub(crate) fn exec() {
    {
        let guard = lock();
        match guard.as_ref() {
            None => return,
            Some(state) if state.running.is_none() => return,
            Some(_) => {}
        }
    }
    dispatch_unit(dispatcher::on_exec);
}

/// §4.6 `wait`. Checks whether a task is running before validating `event`,
/// matching the reference's `so_wait`, which returns `0` for an
/// out-of-range event when nothing is running rather than reporting the
/// range error.
pub(crate) fn wait(event: EventId) -> Result<(), SchedulerError> {
    {
        let guard = lock();
        let state = guard.as_ref().ok_or(SchedulerError::NotInitialized)?;
        if state.running.is_none() {
            return Ok(());
        }
        if event >= state.io {
            return Err(SchedulerError::EventOutOfRange);
        }
    }
    dispatch_unit(move |state| dispatcher::on_wait(state, event));
    Ok(())
}

/// §4.6 `signal`. Per §4.6, this enqueues the running task and reschedules
/// unconditionally whenever a task is running, even if no task is actually
/// waiting on `event` (in which case 0 is returned but the running task is
/// still cycled through the Ready Queue) — the no-op case is solely "no task
/// running".
pub(crate) fn signal(event: EventId) -> Result<usize, SchedulerError> {
    {
        let guard = lock();
        let state = guard.as_ref().ok_or(SchedulerError::NotInitialized)?;
        if event >= state.io {
            return Err(SchedulerError::EventOutOfRange);
        }
        if state.running.is_none() {
            return Ok(0);
        }
    }
    let count = dispatch(move |state| dispatcher::on_signal(state, event));
    Ok(count)
}

/// §4.6 `end`: join every task ever created, in creation order, then tear
/// down the singleton so another `init` is legal.
pub(crate) fn end() {
    let created_order = {
        let guard = lock();
        guard
            .as_ref()
            .map(|state| state.created_order.clone())
            .unwrap_or_default()
    };

    for id in created_order {
        let handle = {
            let mut guard = lock();
            guard
                .as_mut()
                .and_then(|state| state.registry.lookup_mut(id).join_handle.take())
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("task {id:?} panicked");
            }
        }
    }

    log::debug!("scheduler torn down");
    *lock() = None;
}
