//! # Branch: a dynamically resizable worker pool.
//!
//! A [`Branch`] owns one task queue and N worker threads. Submitters push
//! closures in three shapes — fire-and-forget, handle-returning, and
//! sequence (several callables packed into one queue entry) — each with a
//! [`Priority`] tag. Workers run a fetch/execute loop whose idle behavior
//! is set by the branch's [`WaitStrategy`].
//!
//! Resizing is safe under live load: [`Branch::add_worker`] spawns workers
//! that are immediately eligible for pickup, and [`Branch::del_worker`]
//! returns only after the retired workers have exited their loop. A task's
//! panic never kills a worker; it is caught at the wrapper boundary and
//! either reported to the branch's event bus (fire-and-forget) or carried
//! to the consumer of the [`TaskHandle`] (value submissions).
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use arbor::{Branch, Priority, WaitStrategy};
//!
//! let branch = Branch::new(2, WaitStrategy::Blocking);
//!
//! branch.submit(|| println!("background work"));
//! branch.submit_with(Priority::Urgent, || println!("front of the queue"));
//!
//! let answer = branch.submit_future(|| 6 * 7);
//! assert_eq!(branch.wait_tasks(Duration::from_secs(5)), true);
//! assert_eq!(answer.get(), Ok(42));
//! ```

mod core;
mod worker;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::WaitStrategy;
use crate::error::{panic_reason, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::handle::{self, TaskHandle};
use crate::task::{Job, Priority};

use self::core::Core;

/// Publishes a caught fire-and-forget panic to the branch's bus.
fn report_panic(bus: &Bus, payload: Box<dyn Any + Send>) {
    bus.publish(
        Event::now(EventKind::TaskPanicked)
            .with_worker(format!("{:?}", thread::current().id()))
            .with_reason(panic_reason(payload)),
    );
}

/// A dynamically resizable pool of worker threads sharing one task queue.
pub struct Branch {
    core: Arc<Core>,
}

impl Branch {
    /// Creates a branch with `workers` threads (clamped to at least 1) and
    /// the given wait strategy. All workers are running when this returns.
    ///
    /// Diagnostics go to a [`Bus::stderr`] bus; use [`Branch::with_bus`]
    /// to observe events yourself.
    pub fn new(workers: usize, strategy: WaitStrategy) -> Self {
        Self::with_bus(workers, strategy, Bus::stderr())
    }

    /// Creates a branch publishing its events to `bus`.
    pub fn with_bus(workers: usize, strategy: WaitStrategy, bus: Bus) -> Self {
        let core = Arc::new(Core::new(strategy, bus));
        core.add_workers(workers.max(1));
        Self { core }
    }

    /// The branch's event bus.
    pub fn bus(&self) -> &Bus {
        self.core.bus()
    }

    // ---- submission ----

    /// Submits a fire-and-forget task at normal priority.
    ///
    /// A panic inside `f` is caught, reported to the bus, and the worker
    /// continues. Submission never fails.
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_with(Priority::Normal, f);
    }

    /// Submits a fire-and-forget task with an explicit priority tag.
    pub fn submit_with<F>(&self, priority: Priority, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let bus = self.core.bus().clone();
        let job: Job = Box::new(move || {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
                report_panic(&bus, payload);
            }
        });
        self.core.enqueue(priority, job);
    }

    /// Submits a value-returning task at normal priority.
    ///
    /// The returned [`TaskHandle`] yields the task's result; a panic inside
    /// `f` is carried to [`TaskHandle::get`] as [`TaskError::Panicked`],
    /// not written to the diagnostic sink. `R = ()` gives a
    /// completion-only handle.
    pub fn submit_future<F, R>(&self, f: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.submit_future_with(Priority::Normal, f)
    }

    /// Submits a value-returning task with an explicit priority tag.
    pub fn submit_future_with<F, R>(&self, priority: Priority, f: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (promise, handle) = handle::pair::<R>();
        let job: Job = Box::new(move || match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => promise.fulfill(Ok(value)),
            Err(payload) => promise.fulfill(Err(TaskError::Panicked {
                reason: panic_reason(payload),
            })),
        });
        self.core.enqueue(priority, job);
        handle
    }

    /// Packs several callables into one composite task and enqueues it once
    /// at the tail.
    ///
    /// The callables run in declared order under a single panic guard, so a
    /// panic skips the rest of the sequence. Packing amortizes queue
    /// synchronization across micro-tasks: the whole sequence costs one
    /// queue entry.
    pub fn submit_sequence<I>(&self, jobs: I)
    where
        I: IntoIterator<Item = Job>,
    {
        let jobs: Vec<Job> = jobs.into_iter().collect();
        let bus = self.core.bus().clone();
        let job: Job = Box::new(move || {
            let run_all = move || {
                for job in jobs {
                    job();
                }
            };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(run_all)) {
                report_panic(&bus, payload);
            }
        });
        self.core.enqueue(Priority::Sequence, job);
    }

    // ---- quiescence ----

    /// Pauses the branch at a cooperative quiescence barrier.
    ///
    /// Returns `true` iff every live worker drained the queue and reached
    /// the barrier within `timeout`; `false` on timeout or if the branch is
    /// already destructing. Pending tasks keep executing after a timeout.
    ///
    /// At most one thread may wait on a given branch at a time; concurrent
    /// waiters are a caller error. A task that calls `wait_tasks` on its
    /// own branch deadlocks.
    pub fn wait_tasks(&self, timeout: Duration) -> bool {
        self.core.wait_tasks(timeout)
    }

    // ---- resizing ----

    /// Adds `count` workers. New workers are immediately eligible for task
    /// pickup.
    pub fn add_worker(&self, count: usize) {
        self.core.add_workers(count);
    }

    /// Retires `count` workers, waiting until each has exited its loop.
    ///
    /// A no-op when the branch has fewer than `count` workers. Never
    /// cancels a running task.
    pub fn del_worker(&self, count: usize) {
        self.core.del_workers(count);
    }

    // ---- observation ----

    /// Current number of workers.
    pub fn num_workers(&self) -> usize {
        self.core.num_workers()
    }

    /// Number of tasks waiting in the queue.
    pub fn num_tasks(&self) -> usize {
        self.core.num_tasks()
    }

    /// Number of workers idle for at least `timeout` since their last task
    /// completed.
    pub fn count_idle_workers(&self, timeout: Duration) -> usize {
        self.core.count_idle_workers(timeout)
    }

    /// Number of workers currently executing a task.
    pub fn count_busy_workers(&self) -> usize {
        self.core.count_busy_workers()
    }
}

impl Default for Branch {
    /// One worker, blocking wait strategy.
    fn default() -> Self {
        Self::new(1, WaitStrategy::default())
    }
}

impl Drop for Branch {
    /// Requests every worker to retire and polls thread liveness until all
    /// are gone. Tasks still queued are destroyed unexecuted; their handles
    /// resolve to [`TaskError::Dropped`].
    fn drop(&mut self) {
        self.core.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn executes_submitted_tasks() {
        let branch = Branch::new(2, WaitStrategy::Blocking);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            branch.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(branch.wait_tasks(Duration::from_secs(5)));
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn constructor_clamps_to_one_worker() {
        let branch = Branch::new(0, WaitStrategy::Blocking);
        assert_eq!(branch.num_workers(), 1);
    }

    #[test]
    fn future_carries_the_value() {
        let branch = Branch::default();
        let handle = branch.submit_future(|| "ok");
        assert_eq!(handle.get(), Ok("ok"));
    }
}
