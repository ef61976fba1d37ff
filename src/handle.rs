//! # Task handles.
//!
//! [`TaskHandle`] is the consumer half of a value-returning submission: it
//! blocks until the task has run and yields the task's result, with panics
//! transferred as [`TaskError::Panicked`]. The producer half ([`Promise`])
//! travels inside the queued task; if the task is destroyed unexecuted —
//! the branch was torn down first — the handle resolves to
//! [`TaskError::Dropped`].
//!
//! [`HandleSet`] aggregates handles for bulk waiting and collection.
//!
//! # Example
//! ```no_run
//! use arbor::{Branch, HandleSet, WaitStrategy};
//!
//! let branch = Branch::new(2, WaitStrategy::Blocking);
//! let handles: HandleSet<u64> = (0..8)
//!     .map(|n| branch.submit_future(move || n * n))
//!     .collect();
//! let squares = handles.get().unwrap();
//! assert_eq!(squares.len(), 8);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::TaskError;

struct Shared<R> {
    outcome: Mutex<Option<Result<R, TaskError>>>,
    cv: Condvar,
}

/// Creates a connected promise/handle pair.
pub(crate) fn pair<R>() -> (Promise<R>, TaskHandle<R>) {
    let shared = Arc::new(Shared {
        outcome: Mutex::new(None),
        cv: Condvar::new(),
    });
    (
        Promise {
            shared: Arc::clone(&shared),
            fulfilled: false,
        },
        TaskHandle { shared },
    )
}

/// Producer half of a value-returning submission.
///
/// One-shot: the first `fulfill` wins. Dropping an unfulfilled promise
/// resolves the handle to [`TaskError::Dropped`].
pub(crate) struct Promise<R> {
    shared: Arc<Shared<R>>,
    fulfilled: bool,
}

impl<R> Promise<R> {
    pub(crate) fn fulfill(mut self, result: Result<R, TaskError>) {
        self.complete(result);
    }

    fn complete(&mut self, result: Result<R, TaskError>) {
        {
            let mut outcome = self.shared.outcome.lock();
            if outcome.is_none() {
                *outcome = Some(result);
            }
        }
        self.shared.cv.notify_all();
        self.fulfilled = true;
    }
}

impl<R> Drop for Promise<R> {
    fn drop(&mut self) {
        if !self.fulfilled {
            self.complete(Err(TaskError::Dropped));
        }
    }
}

/// Consumer half of a value-returning submission.
pub struct TaskHandle<R> {
    shared: Arc<Shared<R>>,
}

impl<R> TaskHandle<R> {
    /// Returns whether the result is already available.
    pub fn is_ready(&self) -> bool {
        self.shared.outcome.lock().is_some()
    }

    /// Blocks until the task has run (or was dropped unexecuted).
    pub fn wait(&self) {
        let mut outcome = self.shared.outcome.lock();
        self.shared.cv.wait_while(&mut outcome, |o| o.is_none());
    }

    /// Blocks up to `timeout`. Returns `true` if the result is available.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut outcome = self.shared.outcome.lock();
        self.shared
            .cv
            .wait_while_for(&mut outcome, |o| o.is_none(), timeout);
        outcome.is_some()
    }

    /// Blocks until the result is available and consumes it.
    ///
    /// A panic inside the task surfaces as [`TaskError::Panicked`]; a task
    /// destroyed unexecuted surfaces as [`TaskError::Dropped`].
    pub fn get(self) -> Result<R, TaskError> {
        let mut outcome = self.shared.outcome.lock();
        loop {
            if let Some(result) = outcome.take() {
                return result;
            }
            self.shared.cv.wait(&mut outcome);
        }
    }
}

/// Collector over several handles of the same result type.
pub struct HandleSet<R> {
    handles: Vec<TaskHandle<R>>,
}

impl<R> Default for HandleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> HandleSet<R> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub fn push(&mut self, handle: TaskHandle<R>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Blocks until every handle has a result.
    pub fn wait(&self) {
        for handle in &self.handles {
            handle.wait();
        }
    }

    /// Blocks up to `timeout` for all handles. Returns `true` if every
    /// result became available in time.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        for handle in &self.handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !handle.wait_for(remaining) {
                return false;
            }
        }
        true
    }

    /// Blocks for and collects every result, in submission order.
    ///
    /// The first task failure aborts collection and is returned.
    pub fn get(self) -> Result<Vec<R>, TaskError> {
        self.handles.into_iter().map(TaskHandle::get).collect()
    }
}

impl<R> FromIterator<TaskHandle<R>> for HandleSet<R> {
    fn from_iter<I: IntoIterator<Item = TaskHandle<R>>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

impl<R> Extend<TaskHandle<R>> for HandleSet<R> {
    fn extend<I: IntoIterator<Item = TaskHandle<R>>>(&mut self, iter: I) {
        self.handles.extend(iter);
    }
}
