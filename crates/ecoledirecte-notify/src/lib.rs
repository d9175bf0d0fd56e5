//! Notification sinks for Ecole Directe events.
//!
//! A [`Dispatcher`] subscribes to the [`EventBus`](ecoledirecte_core::EventBus)
//! and hands every event to its [`EventSink`]s.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `webhook` | yes | [`sinks::WebhookSink`], JSON POST per event |

pub mod dispatcher;
pub mod error;
pub mod sinks;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use sinks::{EventSink, LogSink, MemorySink, Notification};

#[cfg(feature = "webhook")]
pub use sinks::WebhookSink;
