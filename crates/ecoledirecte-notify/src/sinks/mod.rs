//! Destinations for published events.

pub mod log;
pub mod memory;

#[cfg(feature = "webhook")]
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use ecoledirecte_core::{EcoleDirecteEvent, EventMetadata, EVENT_TYPE};

use crate::Result;

pub use log::LogSink;
pub use memory::MemorySink;

#[cfg(feature = "webhook")]
pub use webhook::WebhookSink;

/// Something that receives every event published on the bus.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Get the sink name.
    fn name(&self) -> &str;

    /// Get the sink type.
    fn sink_type(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Deliver one event.
    async fn send(&self, event: &EcoleDirecteEvent, metadata: &EventMetadata) -> Result<()>;

    /// Get the sink configuration as JSON.
    fn get_config(&self) -> Option<Value> {
        None
    }
}

/// Wire form of an event for external consumers.
#[derive(Debug, Clone, Serialize)]
pub struct Notification<'a> {
    pub event_type: &'static str,
    #[serde(flatten)]
    pub event: &'a EcoleDirecteEvent,
    pub id: String,
    pub timestamp: String,
    pub source: &'a str,
}

impl<'a> Notification<'a> {
    pub fn new(event: &'a EcoleDirecteEvent, metadata: &'a EventMetadata) -> Self {
        Self {
            event_type: EVENT_TYPE,
            event,
            id: metadata.id.to_string(),
            timestamp: metadata.timestamp.to_rfc3339(),
            source: &metadata.source,
        }
    }
}
