//! The per-task rendezvous primitive (§4.5).
//!
//! A `Gate` is a binary, one-shot semaphore: at most one "open" is pending at
//! any time, `open` wakes exactly one waiter, and a consumed open goes back
//! to closed. This is the Rust equivalent of the reference's per-thread
//! `CreateSemaphore(NULL, 0, 1, NULL)` handle, built on `Condvar` the way
//! `r3_port_std`'s worker threads park/unpark around a shared lock rather
//! than reaching for a raw OS semaphore handle.
use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            open: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Wake the single waiter of this gate, if any, and leave it open for a
    /// waiter that hasn't arrived yet.
    pub fn open(&self) {
        let mut open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        *open = true;
        self.cond.notify_one();
    }

    /// Block the calling thread until the gate is opened, then consume the
    /// open and return.
    pub fn wait(&self) {
        let mut open = self.open.lock().unwrap_or_else(|e| e.into_inner());
        while !*open {
            open = self
                .cond
                .wait(open)
                .unwrap_or_else(|e| e.into_inner());
        }
        *open = false;
    }
}
