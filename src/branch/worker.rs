//! # Worker records.
//!
//! A branch keys its workers by a monotonically increasing 64-bit id. Each
//! record holds the worker's (never-joined) thread handle, a busy flag, and
//! the instant the worker last finished a task. Handles are detached by
//! dropping the record; liveness is probed instead of joined so that
//! teardown can proceed even while a worker is stuck in a user task.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub(crate) type WorkerId = u64;

pub(crate) struct WorkerHandle {
    thread: JoinHandle<()>,
    busy: bool,
    last_active: Instant,
}

impl WorkerHandle {
    pub(crate) fn new(thread: JoinHandle<()>) -> Self {
        Self {
            thread,
            busy: false,
            last_active: Instant::now(),
        }
    }

    pub(crate) fn mark_busy(&mut self) {
        self.busy = true;
    }

    /// Clears the busy flag and stamps the completion time.
    pub(crate) fn mark_idle(&mut self) {
        self.busy = false;
        self.last_active = Instant::now();
    }

    pub(crate) fn is_idle(&self) -> bool {
        !self.busy
    }

    /// Whether this worker has been idle at least `timeout` since it last
    /// finished a task.
    pub(crate) fn idle_at_least(&self, now: Instant, timeout: Duration) -> bool {
        self.is_idle() && now.duration_since(self.last_active) >= timeout
    }

    /// Whether the worker's OS thread is still running.
    pub(crate) fn is_alive(&self) -> bool {
        !self.thread.is_finished()
    }
}
