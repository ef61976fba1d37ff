//! # Supervisor: periodic autoscaling controller.
//!
//! A [`Supervisor`] runs one dedicated thread that, every poll iteration,
//! observes each supervised branch and corrects its worker count toward the
//! branch's [`Limits`]:
//!
//! - above `max` → retire the excess;
//! - tasks queued → grow by `min(max - workers, tasks - workers)`
//!   (saturating), so a backlog ramps the pool quickly without
//!   overshooting `max`;
//! - no tasks and above `min` → retire workers idle longer than the
//!   branch's `idle_timeout`, down to `min`.
//!
//! The tick callback fires on its own window ([`Config::tick_interval`]);
//! [`Supervisor::suspend`] stretches that window without pausing the
//! grow/shrink logic — resource correction is never deferred.
//!
//! The supervisor holds its own lock only while snapshotting the branch
//! list; every branch call happens with the lock released, so there is no
//! lock-ordering hazard against branch internals.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use arbor::{Branch, Config, Limits, Supervisor, WaitStrategy};
//!
//! let branch = Arc::new(Branch::new(1, WaitStrategy::Blocking));
//! let supervisor = Supervisor::new(Config::default());
//! supervisor.supervise_with(
//!     &branch,
//!     Limits::new(1, 4, Duration::from_millis(500)),
//! );
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::branch::Branch;
use crate::config::{Config, Limits};
use crate::error::panic_reason;
use crate::events::{Bus, Event, EventKind};

/// Poll interval of the control loop. Also bounds the stop latency of
/// [`Supervisor`]'s drop to one iteration.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

type TickCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
struct Watched {
    branch: Arc<Branch>,
    limits: Limits,
}

struct State {
    watched: Vec<Watched>,
    /// Effective tick window; stretched by `suspend`, restored by `proceed`.
    window: Duration,
    base_window: Duration,
    tick: Option<TickCallback>,
    defaults: Limits,
}

struct Shared {
    stop: AtomicBool,
    bus: Bus,
    state: Mutex<State>,
}

/// A controller thread that resizes branches toward configured limits.
pub struct Supervisor {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Supervisor {
    /// Starts a supervisor with the given configuration. Faults are
    /// reported to a [`Bus::stderr`] bus.
    pub fn new(config: Config) -> Self {
        Self::with_bus(config, Bus::stderr())
    }

    /// Starts a supervisor publishing its events to `bus`.
    pub fn with_bus(config: Config, bus: Bus) -> Self {
        config.limits.validate();
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            bus,
            state: Mutex::new(State {
                watched: Vec::new(),
                window: config.tick_interval,
                base_window: config.tick_interval,
                tick: None,
                defaults: config.limits,
            }),
        });
        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("arbor-supervisor".into())
                .spawn(move || Self::run(shared))
                .expect("failed to spawn supervisor thread")
        };
        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Supervises `branch` under the configured default limits.
    ///
    /// Re-supervising an already-watched branch updates its limits in
    /// place.
    pub fn supervise(&self, branch: &Arc<Branch>) {
        let defaults = self.shared.state.lock().defaults;
        self.supervise_with(branch, defaults);
    }

    /// Supervises `branch` under explicit limits.
    pub fn supervise_with(&self, branch: &Arc<Branch>, limits: Limits) {
        limits.validate();
        let mut state = self.shared.state.lock();
        match state
            .watched
            .iter_mut()
            .find(|w| Arc::ptr_eq(&w.branch, branch))
        {
            Some(watched) => watched.limits = limits,
            None => state.watched.push(Watched {
                branch: Arc::clone(branch),
                limits,
            }),
        }
    }

    /// Stretches the tick window to `window`.
    ///
    /// The tick callback fires less often; grow/shrink corrections keep
    /// running at full cadence.
    pub fn suspend(&self, window: Duration) {
        self.shared.state.lock().window = window;
    }

    /// Restores the original tick window.
    pub fn proceed(&self) {
        let mut state = self.shared.state.lock();
        state.window = state.base_window;
    }

    /// Installs a callback fired once per tick window.
    ///
    /// The callback runs on the supervisor thread with no supervisor lock
    /// held. A callback that calls into this supervisor deadlocks; that is
    /// a caller error.
    pub fn set_tick_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.state.lock().tick = Some(Arc::new(callback));
    }

    fn run(shared: Arc<Shared>) {
        let mut last_tick = Instant::now();
        while !shared.stop.load(Ordering::SeqCst) {
            let (watched, window, tick) = {
                let state = shared.state.lock();
                (state.watched.clone(), state.window, state.tick.clone())
            };

            for w in &watched {
                let result = catch_unwind(AssertUnwindSafe(|| {
                    Self::adjust(&w.branch, &w.limits, &shared.bus);
                }));
                if let Err(payload) = result {
                    shared.bus.publish(
                        Event::now(EventKind::SupervisorFault)
                            .with_reason(panic_reason(payload)),
                    );
                }
            }

            if last_tick.elapsed() >= window {
                last_tick = Instant::now();
                if let Some(tick) = tick {
                    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (*tick)())) {
                        shared.bus.publish(
                            Event::now(EventKind::SupervisorFault)
                                .with_reason(panic_reason(payload)),
                        );
                    }
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// One correction pass over a single branch. Scale events are
    /// published after the branch call returns, with no lock held.
    fn adjust(branch: &Branch, limits: &Limits, bus: &Bus) {
        let tasks = branch.num_tasks();
        let workers = branch.num_workers();

        if workers > limits.max {
            let excess = workers - limits.max;
            branch.del_worker(excess);
            bus.publish(Event::now(EventKind::ScaleDown).with_count(excess));
            return;
        }

        if tasks > 0 {
            let grow = (limits.max - workers).min(tasks.saturating_sub(workers));
            if grow > 0 {
                branch.add_worker(grow);
                bus.publish(Event::now(EventKind::ScaleUp).with_count(grow));
            }
        } else if workers > limits.min {
            let idle = branch.count_idle_workers(limits.idle_timeout);
            if idle > limits.min {
                let excess = idle - limits.min;
                branch.del_worker(excess);
                bus.publish(Event::now(EventKind::ScaleDown).with_count(excess));
            }
        }
    }
}

impl Drop for Supervisor {
    /// Stops the control loop and joins its thread. The loop checks the
    /// stop flag once per poll interval, so termination latency is bounded
    /// by one interval.
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
