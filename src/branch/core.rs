//! # Branch internals.
//!
//! One mutex guards the worker table; request flags are atomics so workers
//! can poll them on the hot path without the lock. Wake semantics fan out
//! over five condition variables:
//!
//! - `task_cv` — wakes parked workers for a new task or a state change;
//! - `thread_cv` — releases workers from the quiescence barrier;
//! - `task_idle_cv` — workers report arrival at the barrier;
//! - `task_resume_cv` — workers report leaving the barrier;
//! - `task_deletion_cv` — workers acknowledge deletion.
//!
//! Conflating any two of these turns targeted wakeups into thundering
//! herds with the wrong predicates; the fan-out is load-bearing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::WaitStrategy;
use crate::events::{Bus, Event, EventKind};
use crate::queue::TaskQueue;
use crate::task::{Job, Priority};

use super::worker::{WorkerHandle, WorkerId};

/// Spin bound for the balanced wait strategy.
const MAX_SPIN: u32 = 10_000;

/// Poll interval for teardown and the balanced sleep.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The branch's request vector. Workers observe these without the lock.
pub(super) struct RequestFlags {
    deleting: AtomicBool,
    waiting: AtomicBool,
    destructing: AtomicBool,
}

impl RequestFlags {
    fn new() -> Self {
        Self {
            deleting: AtomicBool::new(false),
            waiting: AtomicBool::new(false),
            destructing: AtomicBool::new(false),
        }
    }

    pub(super) fn deleting(&self) -> bool {
        self.deleting.load(Ordering::SeqCst)
    }

    pub(super) fn waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }

    pub(super) fn destructing(&self) -> bool {
        self.destructing.load(Ordering::SeqCst)
    }

    /// Any request a parked worker must wake up for.
    fn requested(&self) -> bool {
        self.deleting() || self.waiting() || self.destructing()
    }
}

struct WorkerTable {
    workers: HashMap<WorkerId, WorkerHandle>,
}

pub(super) struct Core {
    queue: TaskQueue<Job>,
    strategy: WaitStrategy,
    bus: Bus,

    next_worker_id: AtomicU64,
    idle_workers: AtomicUsize,
    resumed_workers: AtomicUsize,
    pending_deletions: AtomicUsize,
    pub(super) flags: RequestFlags,

    table: Mutex<WorkerTable>,
    task_cv: Condvar,
    thread_cv: Condvar,
    task_idle_cv: Condvar,
    task_resume_cv: Condvar,
    task_deletion_cv: Condvar,
}

impl Core {
    pub(super) fn new(strategy: WaitStrategy, bus: Bus) -> Self {
        Self {
            queue: TaskQueue::new(),
            strategy,
            bus,
            next_worker_id: AtomicU64::new(0),
            idle_workers: AtomicUsize::new(0),
            resumed_workers: AtomicUsize::new(0),
            pending_deletions: AtomicUsize::new(0),
            flags: RequestFlags::new(),
            table: Mutex::new(WorkerTable {
                workers: HashMap::new(),
            }),
            task_cv: Condvar::new(),
            thread_cv: Condvar::new(),
            task_idle_cv: Condvar::new(),
            task_resume_cv: Condvar::new(),
            task_deletion_cv: Condvar::new(),
        }
    }

    pub(super) fn bus(&self) -> &Bus {
        &self.bus
    }

    // ---- submission path ----

    pub(super) fn enqueue(&self, priority: Priority, job: Job) {
        match priority {
            Priority::Urgent => self.queue.push_front(job),
            Priority::Normal | Priority::Sequence => self.queue.push_back(job),
        }
        if self.strategy == WaitStrategy::Blocking {
            self.task_cv.notify_one();
        }
    }

    // ---- observation ----

    pub(super) fn num_workers(&self) -> usize {
        self.table.lock().workers.len()
    }

    pub(super) fn num_tasks(&self) -> usize {
        self.queue.len()
    }

    pub(super) fn count_idle_workers(&self, timeout: Duration) -> usize {
        let table = self.table.lock();
        let now = Instant::now();
        table
            .workers
            .values()
            .filter(|w| w.idle_at_least(now, timeout))
            .count()
    }

    pub(super) fn count_busy_workers(&self) -> usize {
        let table = self.table.lock();
        table.workers.values().filter(|w| !w.is_idle()).count()
    }

    // ---- resizing ----

    /// Spawns `count` workers under the lock. New workers are immediately
    /// eligible for task pickup; there is no started handshake.
    pub(super) fn add_workers(self: &Arc<Self>, count: usize) {
        {
            let mut table = self.table.lock();
            for _ in 0..count {
                let id = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
                let core = Arc::clone(self);
                let handle = thread::Builder::new()
                    .name(format!("arbor-worker-{id}"))
                    .spawn(move || core.run(id))
                    .expect("failed to spawn worker thread");
                table.workers.insert(id, WorkerHandle::new(handle));
            }
        }
        if count > 0 {
            self.bus
                .publish(Event::now(EventKind::WorkerSpawned).with_count(count));
        }
    }

    /// Retires `count` workers and waits for each to acknowledge.
    ///
    /// Clamps to a no-op when the branch has fewer than `count` workers.
    /// Does not cancel a busy worker's current task; the worker retires on
    /// its next loop iteration.
    pub(super) fn del_workers(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut table = self.table.lock();
        if table.workers.is_empty() || table.workers.len() < count {
            return;
        }

        self.pending_deletions.fetch_add(count, Ordering::SeqCst);
        self.flags.deleting.store(true, Ordering::SeqCst);
        if self.strategy == WaitStrategy::Blocking {
            self.task_cv.notify_all();
        }

        self.task_deletion_cv.wait_while(&mut table, |_| {
            self.pending_deletions.load(Ordering::SeqCst) > 0
        });
        self.flags.deleting.store(false, Ordering::SeqCst);
    }

    // ---- quiescence barrier ----

    /// Waits until every live worker has drained the queue and arrived at
    /// the barrier, then releases them together.
    ///
    /// Returns `true` iff all workers reached the barrier within `timeout`.
    /// The release handshake always completes regardless, so a subsequent
    /// `del_worker` cannot race a barely-released worker.
    pub(super) fn wait_tasks(&self, timeout: Duration) -> bool {
        if self.flags.destructing() {
            return false;
        }

        let done;
        {
            let mut table = self.table.lock();
            self.idle_workers.store(0, Ordering::SeqCst);
            self.flags.waiting.store(true, Ordering::SeqCst);
            if self.strategy == WaitStrategy::Blocking {
                self.task_cv.notify_all();
            }

            // ">=" rather than "==": the supervisor may retire workers while
            // we wait, shrinking the table under us.
            self.task_idle_cv.wait_while_for(
                &mut table,
                |t| self.idle_workers.load(Ordering::SeqCst) < t.workers.len(),
                timeout,
            );
            done = self.idle_workers.load(Ordering::SeqCst) >= table.workers.len();

            self.flags.waiting.store(false, Ordering::SeqCst);
        }

        self.thread_cv.notify_all();

        let mut table = self.table.lock();
        self.task_resume_cv.wait_while(&mut table, |_| {
            self.resumed_workers.load(Ordering::SeqCst)
                < self.idle_workers.load(Ordering::SeqCst)
        });
        self.resumed_workers.store(0, Ordering::SeqCst);
        done
    }

    // ---- teardown ----

    /// Requests every worker to retire, then polls thread liveness until
    /// all are gone. Handles are never joined; a worker stuck in a user
    /// task keeps this loop spinning (there is no teardown deadline).
    pub(super) fn teardown(&self) {
        {
            let table = self.table.lock();
            self.pending_deletions
                .store(table.workers.len(), Ordering::SeqCst);
            self.flags.destructing.store(true, Ordering::SeqCst);
            if self.strategy == WaitStrategy::Blocking {
                self.task_cv.notify_all();
            }
        }

        loop {
            if self.pending_deletions.load(Ordering::SeqCst) > 0 {
                let mut table = self.table.lock();
                table.workers.retain(|_, worker| {
                    if worker.is_alive() {
                        true
                    } else {
                        self.pending_deletions.fetch_sub(1, Ordering::SeqCst);
                        false
                    }
                });
            } else {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    // ---- worker loop ----

    /// The fetch/execute loop. Deletion requests are checked before the
    /// task fetch so a destructing branch always drains its workers.
    pub(super) fn run(self: Arc<Self>, id: WorkerId) {
        let mut spin = 0u32;
        loop {
            if self.flags.destructing() || self.flags.deleting() {
                if self.try_retire(id) {
                    self.bus.publish(
                        Event::now(EventKind::WorkerRetired)
                            .with_worker(format!("{:?}", thread::current().id())),
                    );
                    return;
                }
            }

            if let Some(job) = self.queue.try_pop() {
                self.set_busy(id);
                job();
                spin = 0;
                self.set_idle(id);
            } else if self.flags.waiting() {
                self.park_at_barrier();
            }

            self.idle_wait(&mut spin);
        }
    }

    /// Claims a deletion slot if one is pending. On success the worker has
    /// already been removed from the table and must exit its loop.
    fn try_retire(&self, id: WorkerId) -> bool {
        let mut table = self.table.lock();
        if self.pending_deletions.load(Ordering::SeqCst) == 0 {
            return false;
        }
        self.pending_deletions.fetch_sub(1, Ordering::SeqCst);
        table.workers.remove(&id);

        if self.flags.waiting() {
            self.task_idle_cv.notify_one();
        }
        if self.flags.destructing() {
            self.thread_cv.notify_one();
        }
        self.task_deletion_cv.notify_one();
        true
    }

    /// Reports arrival at the quiescence barrier, parks until released,
    /// then reports departure.
    fn park_at_barrier(&self) {
        let mut table = self.table.lock();
        self.idle_workers.fetch_add(1, Ordering::SeqCst);
        self.task_idle_cv.notify_one();

        self.thread_cv
            .wait_while(&mut table, |_| self.flags.waiting());

        self.resumed_workers.fetch_add(1, Ordering::SeqCst);
        self.task_resume_cv.notify_one();
    }

    fn set_busy(&self, id: WorkerId) {
        let mut table = self.table.lock();
        if let Some(worker) = table.workers.get_mut(&id) {
            worker.mark_busy();
        }
    }

    fn set_idle(&self, id: WorkerId) {
        let mut table = self.table.lock();
        if let Some(worker) = table.workers.get_mut(&id) {
            worker.mark_idle();
        }
    }

    fn idle_wait(&self, spin: &mut u32) {
        match self.strategy {
            WaitStrategy::LowLatency => thread::yield_now(),
            WaitStrategy::Balanced => {
                if *spin < MAX_SPIN {
                    *spin += 1;
                    thread::yield_now();
                } else {
                    thread::sleep(POLL_INTERVAL);
                }
            }
            WaitStrategy::Blocking => {
                let mut table = self.table.lock();
                self.task_cv.wait_while(&mut table, |_| {
                    self.queue.is_empty() && !self.flags.requested()
                });
            }
        }
    }
}
