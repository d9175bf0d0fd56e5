//! Core types for the Ecole Directe poller.
//!
//! This crate defines what the other crates exchange: configuration, the
//! error type, the session and record models, and the event bus.

pub mod config;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod model;

pub use config::{ApiConfig, Config, NotifyConfig};
pub use error::{Error, Result};
pub use event::{kinds, EcoleDirecteEvent, EventMetadata, EVENT_TYPE};
pub use eventbus::{EventBus, EventBusReceiver, DEFAULT_CHANNEL_CAPACITY};
pub use model::{
    modules, AccountType, AttendanceEvent, AttendanceKind, Discipline, Evaluation, Form,
    GeneralAverage, Grade, Homework, Lesson, MailboxSummary, Session, Skill, Student, Wallet,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
