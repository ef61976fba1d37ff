//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers
//! into a [`Bus`](crate::events::Bus); [`StderrWriter`] is the built-in
//! diagnostic sink.

mod log;
mod subscriber;

pub use log::StderrWriter;
pub use subscriber::Subscribe;
