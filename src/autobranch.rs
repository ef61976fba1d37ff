//! # AutoBranch: a self-scaling branch.
//!
//! Bundles one [`Branch`] with a private [`Supervisor`] so the pool sizes
//! itself inside configured [`Limits`] without any external wiring. The
//! branch starts at one worker and grows under load.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use arbor::{AutoBranch, Limits, WaitStrategy};
//!
//! let pool = AutoBranch::new(
//!     Limits::new(1, 4, Duration::from_millis(500)),
//!     WaitStrategy::Blocking,
//!     Duration::from_millis(100),
//! );
//!
//! let h = pool.submit_future(|| 2 + 2);
//! assert_eq!(h.get(), Ok(4));
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::branch::Branch;
use crate::config::{Config, Limits, WaitStrategy, DEFAULT_TICK_INTERVAL};
use crate::handle::TaskHandle;
use crate::supervisor::Supervisor;
use crate::task::{Job, Priority};

/// A branch that supervises itself inside `[min, max]` worker bounds.
pub struct AutoBranch {
    // Declared before `branch`: the supervisor must stop first on drop.
    supervisor: Supervisor,
    branch: Arc<Branch>,
}

impl AutoBranch {
    /// Creates a self-scaling branch with explicit limits.
    pub fn new(limits: Limits, strategy: WaitStrategy, tick_interval: Duration) -> Self {
        let branch = Arc::new(Branch::new(1, strategy));
        let supervisor = Supervisor::new(Config {
            limits,
            tick_interval,
        });
        supervisor.supervise_with(&branch, limits);
        Self { supervisor, branch }
    }

    /// Creates a self-scaling branch whose bounds are core-count multiples.
    pub fn per_core(
        min_mult: f64,
        max_mult: f64,
        strategy: WaitStrategy,
        tick_interval: Duration,
    ) -> Self {
        Self::new(Limits::per_core(min_mult, max_mult), strategy, tick_interval)
    }

    /// The underlying branch handle.
    pub fn branch(&self) -> &Arc<Branch> {
        &self.branch
    }

    // ---- submission passthroughs ----

    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.branch.submit(f);
    }

    pub fn submit_with<F>(&self, priority: Priority, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.branch.submit_with(priority, f);
    }

    pub fn submit_future<F, R>(&self, f: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.branch.submit_future(f)
    }

    pub fn submit_future_with<F, R>(&self, priority: Priority, f: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.branch.submit_future_with(priority, f)
    }

    pub fn submit_sequence<I>(&self, jobs: I)
    where
        I: IntoIterator<Item = Job>,
    {
        self.branch.submit_sequence(jobs);
    }

    // ---- branch passthroughs ----

    /// See [`Branch::wait_tasks`].
    pub fn wait_tasks(&self, timeout: Duration) -> bool {
        self.branch.wait_tasks(timeout)
    }

    pub fn num_workers(&self) -> usize {
        self.branch.num_workers()
    }

    pub fn num_tasks(&self) -> usize {
        self.branch.num_tasks()
    }

    // ---- supervision passthroughs ----

    /// Replaces the worker limits in place.
    pub fn set_limits(&self, limits: Limits) {
        self.supervisor.supervise_with(&self.branch, limits);
    }

    /// See [`Supervisor::suspend`].
    pub fn suspend(&self, window: Duration) {
        self.supervisor.suspend(window);
    }

    /// See [`Supervisor::proceed`].
    pub fn proceed(&self) {
        self.supervisor.proceed();
    }

    /// See [`Supervisor::set_tick_callback`].
    pub fn set_tick_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.supervisor.set_tick_callback(callback);
    }
}

impl Default for AutoBranch {
    /// Default limits, blocking strategy, 1 s tick window.
    fn default() -> Self {
        Self::new(
            Limits::default(),
            WaitStrategy::default(),
            DEFAULT_TICK_INTERVAL,
        )
    }
}
