//! Wait Set (§4.3): tasks blocked in `wait(event)`.
use crate::task::{EventId, Priority, TaskId};

struct WaitEntry {
    id: TaskId,
    priority: Priority,
    event: EventId,
}

#[derive(Default)]
pub(crate) struct WaitSet {
    entries: Vec<WaitEntry>,
}

impl WaitSet {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, id: TaskId, priority: Priority, event: EventId) {
        self.entries.push(WaitEntry { id, priority, event });
    }

    /// Remove every entry blocked on `event`, in the order they were
    /// inserted, returning their `(id, priority)` pairs.
    pub fn drain(&mut self, event: EventId) -> Vec<(TaskId, Priority)> {
        let mut drained = Vec::new();
        let mut remaining = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.event == event {
                drained.push((entry.id, entry.priority));
            } else {
                remaining.push(entry);
            }
        }
        self.entries = remaining;
        drained
    }
}
