//! Blocking FIFO mailbox feeding the actor thread

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct MailboxState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-producer, single-consumer mailbox
pub struct Mailbox<T> {
    state: Mutex<MailboxState<T>>,
    ready: Condvar,
}

impl<T> Mailbox<T> {
    /// Create an open, empty mailbox
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MailboxState {
                queue: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Enqueue an item. Hands it back if the mailbox is closed.
    pub fn post(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(item);
        }
        state.queue.push_back(item);
        self.ready.notify_one();
        Ok(())
    }

    /// Block until an item is available.
    ///
    /// Returns `None` once the mailbox is closed and fully drained.
    pub fn next(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    /// Refuse further posts; items already queued are still delivered.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Check if the mailbox has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
