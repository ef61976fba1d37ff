//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] — the extension point for observing branch and
//! supervisor events.
//!
//! ## Rules
//! - `on_event` runs synchronously in the publisher's thread; keep it fast.
//! - Never call back into the branch or supervisor that published the
//!   event — that is a deadlock, same as the tick-callback pitfall.
//! - Handle errors internally; do not panic.
//!
//! ## Example
//! ```
//! use arbor::events::{Event, EventKind};
//! use arbor::subscribers::Subscribe;
//!
//! struct Metrics;
//!
//! impl Subscribe for Metrics {
//!     fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskPanicked {
//!             // increment a failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "metrics"
//!     }
//! }
//! ```

use crate::events::Event;

/// Event subscriber for runtime observability.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event. Called in the publisher's thread.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name for logging and metrics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
