//! # Error types surfaced through task handles.
//!
//! The framework never returns errors from its own control surface —
//! submission is infallible, resize clamps, and `wait_tasks` signals timeout
//! by value. The only error channel is [`TaskError`], delivered through
//! [`TaskHandle::get`](crate::TaskHandle::get) when a value-returning task
//! fails.

use std::any::Any;

use thiserror::Error;

/// Failure of a single submitted task.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task panicked; `reason` carries the rendered panic payload.
    #[error("task panicked: {reason}")]
    Panicked {
        /// Panic payload rendered to text.
        reason: String,
    },

    /// The task was destroyed before it ran — its branch was torn down while
    /// the task was still queued.
    #[error("task dropped before completion")]
    Dropped,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Dropped => "task_dropped",
        }
    }
}

/// Renders a caught panic payload to text.
///
/// `&str` and `String` payloads pass through; anything else becomes an
/// "unknown panic" line.
pub(crate) fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let panicked = TaskError::Panicked { reason: "x".into() };
        assert_eq!(panicked.as_label(), "task_panicked");
        assert_eq!(TaskError::Dropped.as_label(), "task_dropped");
    }

    #[test]
    fn str_and_string_payloads_pass_through() {
        assert_eq!(panic_reason(Box::new("boom")), "boom");
        assert_eq!(panic_reason(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_reason(Box::new(42u32)), "unknown panic payload");
    }
}
