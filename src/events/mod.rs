//! # Diagnostic events.
//!
//! Branches and supervisors publish lifecycle and failure events to a
//! [`Bus`], which fans them out synchronously to registered
//! [`Subscribe`](crate::subscribers::Subscribe) implementations. The
//! default bus carries the built-in
//! [`StderrWriter`](crate::subscribers::StderrWriter), which renders task
//! panics and supervisor faults to the process standard error stream.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
