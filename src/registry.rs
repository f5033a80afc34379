//! Task Registry (§4.4): owns every live [`Tcb`], keyed by
//! [`TaskId`]. Grounded on `r3_port_std::ums::State::threads: Slab<WorkerThread>`
//! — a `slab::Slab` gives stable, reusable integer keys for free, which is
//! exactly the "stable references for the lifetime of the scheduler" contract
//! §4.4 asks for.
use slab::Slab;

use crate::task::{Tcb, TaskId};

#[derive(Default)]
pub(crate) struct Registry {
    tasks: Slab<Tcb>,
}

impl Registry {
    pub fn new() -> Self {
        Self { tasks: Slab::new() }
    }

    pub fn insert(&mut self, tcb: Tcb) -> TaskId {
        TaskId(self.tasks.insert(tcb))
    }

    pub fn lookup(&self, id: TaskId) -> &Tcb {
        &self.tasks[id.0]
    }

    pub fn lookup_mut(&mut self, id: TaskId) -> &mut Tcb {
        &mut self.tasks[id.0]
    }
}
