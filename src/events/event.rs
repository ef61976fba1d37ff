//! # Runtime events emitted by branches and supervisors.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the kind plus
//! optional metadata (worker thread id, failure reason, worker count) and
//! timestamps.
//!
//! ## Ordering
//! Each event gets a globally unique, monotonically increasing sequence
//! number, so subscribers can order events even when they buffer them.
//!
//! ## Example
//! ```
//! use arbor::events::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskPanicked)
//!     .with_worker("ThreadId(3)")
//!     .with_reason("index out of bounds");
//!
//! assert_eq!(ev.kind, EventKind::TaskPanicked);
//! assert_eq!(ev.reason.as_deref(), Some("index out of bounds"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A fire-and-forget task panicked; the worker caught it and continued.
    TaskPanicked,
    /// A branch spawned workers (`count` carries how many).
    WorkerSpawned,
    /// A worker acknowledged a deletion request and exited its loop.
    WorkerRetired,
    /// The supervisor grew a branch toward its limits (`count` carries how
    /// many workers were added).
    ScaleUp,
    /// The supervisor shrank a branch toward its limits (`count` carries
    /// how many workers were retired).
    ScaleDown,
    /// The supervisor loop caught a panic from a branch call.
    SupervisorFault,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards; use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Thread id of the worker involved, if applicable.
    pub worker: Option<String>,
    /// Failure description, if the event represents a failure.
    pub reason: Option<String>,
    /// Worker count, for spawn events.
    pub count: Option<usize>,
}

impl Event {
    /// Creates an event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches the worker's thread id.
    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    /// Attaches a failure description.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a worker count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}
