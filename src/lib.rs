//! # arbor
//!
//! **Arbor** is an in-process task-execution framework built around
//! dynamically resizable worker pools.
//!
//! A [`Branch`] is a pool of OS threads sharing one task queue; a
//! [`Supervisor`] is a controller thread that grows and shrinks branches
//! toward configured [`Limits`]; a [`Workspace`] owns both and spreads
//! submissions across branches round-robin.
//!
//! ## Features
//!
//! | Area            | Description                                                      | Key types / traits                  |
//! |-----------------|------------------------------------------------------------------|-------------------------------------|
//! | **Branches**    | Priority submission, wait strategies, quiescence, safe resizing. | [`Branch`], [`Priority`], [`WaitStrategy`] |
//! | **Handles**     | Blocking result handles for value-returning tasks.               | [`TaskHandle`], [`HandleSet`]       |
//! | **Supervision** | Autoscaling toward `[min, max]` bounds with idle detection.      | [`Supervisor`], [`Limits`], [`Config`] |
//! | **Hosting**     | Multi-branch registry with round-robin dispatch.                 | [`Workspace`], [`AutoBranch`]       |
//! | **Diagnostics** | Lifecycle/failure events fanned out to subscribers.              | [`events::Bus`], [`subscribers::Subscribe`] |
//! | **Errors**      | Typed task failures carried through handles.                     | [`TaskError`]                       |
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use arbor::{Branch, Config, Limits, Priority, Supervisor, WaitStrategy};
//!
//! // A pool of two workers with the default blocking strategy.
//! let branch = Arc::new(Branch::new(2, WaitStrategy::Blocking));
//!
//! // Normal and urgent work.
//! branch.submit(|| { /* background work */ });
//! branch.submit_with(Priority::Urgent, || { /* jumps the queue */ });
//!
//! // A value-returning task.
//! let answer = branch.submit_future(|| 6 * 7);
//!
//! // Autoscale between 1 and 8 workers.
//! let supervisor = Supervisor::new(Config::default());
//! supervisor.supervise_with(&branch, Limits::new(1, 8, Duration::from_secs(5)));
//!
//! assert!(branch.wait_tasks(Duration::from_secs(5)));
//! assert_eq!(answer.get(), Ok(42));
//! ```
//!
//! ## Caller discipline
//!
//! - At most one thread may block in [`Branch::wait_tasks`] per branch.
//! - A task must not call `wait_tasks` on its own branch; a tick callback
//!   must not call into its own supervisor; a subscriber must not call
//!   back into the publishing component. Each of these deadlocks.
//!
//! ---

mod autobranch;
mod branch;
mod config;
mod error;
mod handle;
mod queue;
mod supervisor;
mod workspace;

pub mod events;
pub mod subscribers;
pub mod task;

// ---- Public re-exports ----

pub use autobranch::AutoBranch;
pub use branch::Branch;
pub use config::{Config, Limits, WaitStrategy, WAIT_FOREVER};
pub use error::TaskError;
pub use handle::{HandleSet, TaskHandle};
pub use supervisor::Supervisor;
pub use task::{job, Job, Priority};
pub use workspace::{BranchId, SupervisorId, Workspace};
