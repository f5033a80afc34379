use std::cell::Cell;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::gate::Gate;

/// Priority of a task, `0..=MAX_PRIO`. Higher values run first.
pub type Priority = u32;

/// An event id in `0..io`.
pub type EventId = u32;

/// A user-supplied task body. Receives its own priority, matching the
/// reference's `so_handler` signature (`void (*)(unsigned int)`).
pub type TaskBody = Box<dyn FnOnce(Priority) + Send + 'static>;

/// Opaque handle to a forked task.
///
/// Backed by the `slab` key the task's [`crate::registry::Registry`] entry
/// lives at, the same way `r3_port_std::ums::ThreadId` wraps a `Slab` index
/// rather than exposing the underlying pointer or OS thread id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

/// Task control block. One per forked task, owned by the
/// [`crate::registry::Registry`] for the task's whole lifetime.
pub(crate) struct Tcb {
    pub priority: Priority,
    pub remaining_quantum: Cell<u32>,
    pub gate: Arc<Gate>,
    pub join_handle: Option<JoinHandle<()>>,
}

impl Tcb {
    /// Construct a TCB before the OS thread has been spawned. The join
    /// handle is filled in afterwards via [`Tcb::set_join_handle`], the same
    /// two-step sequence `r3_port_std::ums` uses (`threads.insert` with a
    /// placeholder, then `threads[ptr].join_handle = Some(join_handle)`)
    /// because the handle doesn't exist until after the registry slot does.
    pub fn new_pending(priority: Priority, quantum: u32, gate: Arc<Gate>) -> Self {
        Self {
            priority,
            remaining_quantum: Cell::new(quantum),
            gate,
            join_handle: None,
        }
    }

    pub fn set_join_handle(&mut self, handle: JoinHandle<()>) {
        self.join_handle = Some(handle);
    }
}
