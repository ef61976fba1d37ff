use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Built-in subscriber that renders failures to standard error.
///
/// Writes one line per caught task panic (with the worker's thread id and
/// the panic text) and one line per supervisor fault. Lifecycle events are
/// ignored; attach a custom [`Subscribe`] to observe those.
pub struct StderrWriter;

impl Subscribe for StderrWriter {
    fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskPanicked => {
                eprintln!(
                    "[panic] worker={} reason={}",
                    e.worker.as_deref().unwrap_or("?"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
            EventKind::SupervisorFault => {
                eprintln!(
                    "[supervisor-fault] reason={}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
            EventKind::WorkerSpawned
            | EventKind::WorkerRetired
            | EventKind::ScaleUp
            | EventKind::ScaleDown => {}
        }
    }

    fn name(&self) -> &'static str {
        "stderr"
    }
}
