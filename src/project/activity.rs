//! Outstanding-work counter shared by both queues.
//!
//! Every queued command, pending parse and queued analysis holds one unit
//! until it is finished, so a zero count means both queues are drained.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub(crate) struct Activity {
    pending: Mutex<usize>,
    idle: Condvar,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) {
        *self.pending.lock() += 1;
    }

    pub fn end(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Block until the count reaches zero or `timeout` passes; returns the
    /// count at wake-up.
    pub fn wait_idle(&self, timeout: Duration) -> usize {
        let mut pending = self.pending.lock();
        if *pending > 0 {
            self.idle.wait_for(&mut pending, timeout);
        }
        *pending
    }
}
