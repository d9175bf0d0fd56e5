//! Forwards bus events to the configured sinks.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ecoledirecte_core::{EcoleDirecteEvent, EventBus, EventMetadata, NotifyConfig};

use crate::sinks::{EventSink, LogSink};
use crate::Result;

/// Fan-out from the event bus to every enabled sink.
#[derive(Clone, Default)]
pub struct Dispatcher {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks described by `config`. `qcm_file` is named in QCM warnings.
    pub fn from_config(config: &NotifyConfig, qcm_file: &str) -> Result<Self> {
        let mut dispatcher = Self::new();
        if config.log {
            dispatcher = dispatcher.with_sink(Arc::new(LogSink::new("log").with_qcm_file(qcm_file)));
        }
        if let Some(url) = &config.webhook_url {
            dispatcher = dispatcher.with_webhook(url)?;
        }
        Ok(dispatcher)
    }

    #[cfg(feature = "webhook")]
    fn with_webhook(self, url: &str) -> Result<Self> {
        let sink = crate::sinks::WebhookSink::new("webhook", url)?;
        Ok(self.with_sink(Arc::new(sink)))
    }

    #[cfg(not(feature = "webhook"))]
    fn with_webhook(self, url: &str) -> Result<Self> {
        warn!(category = "notify", url, "Built without the webhook feature, ignoring webhook_url");
        Ok(self)
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send one event to every enabled sink at once and return how many
    /// accepted it. A failing sink does not stop the others.
    pub async fn dispatch(&self, event: &EcoleDirecteEvent, metadata: &EventMetadata) -> usize {
        let enabled: Vec<&Arc<dyn EventSink>> =
            self.sinks.iter().filter(|s| s.is_enabled()).collect();
        let results = join_all(enabled.iter().map(|sink| sink.send(event, metadata))).await;

        let mut delivered = 0;
        for (sink, result) in enabled.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    category = "notify",
                    sink = sink.name(),
                    kind = %event.kind,
                    error = %e,
                    "Failed to deliver event"
                ),
            }
        }
        debug!(category = "notify", kind = %event.kind, delivered, "Event dispatched");
        delivered
    }

    /// Forward every event published on `bus` until the bus closes.
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let mut receiver = bus.subscribe();
        info!(category = "notify", sinks = ?self.sink_names(), "Dispatcher started");

        tokio::spawn(async move {
            while let Some((event, metadata)) = receiver.recv().await {
                self.dispatch(&event, &metadata).await;
            }
            debug!(category = "notify", "Event bus closed, dispatcher stopping");
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
