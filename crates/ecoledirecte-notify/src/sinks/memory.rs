//! In-memory sink (for testing).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ecoledirecte_core::{EcoleDirecteEvent, EventMetadata};

use super::EventSink;
use crate::{Error, Result};

/// Keeps every received event. Clones share the same buffer.
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    enabled: bool,
    events: Arc<Mutex<Vec<(EcoleDirecteEvent, EventMetadata)>>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }

    pub async fn events(&self) -> Vec<EcoleDirecteEvent> {
        self.events
            .lock()
            .await
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub async fn received(&self) -> Vec<(EcoleDirecteEvent, EventMetadata)> {
        self.events.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }

    pub async fn count(&self) -> usize {
        self.events.lock().await.len()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        "memory"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, event: &EcoleDirecteEvent, metadata: &EventMetadata) -> Result<()> {
        if !self.enabled {
            return Err(Error::SinkDisabled(self.name.clone()));
        }
        self.events
            .lock()
            .await
            .push((event.clone(), metadata.clone()));
        Ok(())
    }
}
