//! In-process event bus.
//!
//! The auth client publishes `new_qcm` events and the coordinator publishes
//! one event per new record. Notification sinks subscribe and forward them.

use tokio::sync::broadcast;

use crate::event::{EcoleDirecteEvent, EventMetadata};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Broadcast bus for [`EcoleDirecteEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<(EcoleDirecteEvent, EventMetadata)>,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified capacity.
    ///
    /// The capacity determines how many events are buffered for slow subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Get the number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event on behalf of `source`.
    ///
    /// Returns `true` if there was at least one subscriber. Events published
    /// with no subscriber are dropped.
    pub fn publish(&self, event: EcoleDirecteEvent, source: &str) -> bool {
        self.publish_with_metadata(event, EventMetadata::new(source))
    }

    pub fn publish_with_metadata(&self, event: EcoleDirecteEvent, metadata: EventMetadata) -> bool {
        self.tx.send((event, metadata)).is_ok()
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for all events from the event bus.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(EcoleDirecteEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` once the bus is closed. Lagging receivers skip the
    /// events they missed and keep going.
    pub async fn recv(&mut self) -> Option<(EcoleDirecteEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(category = "events", skipped, "Event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<(EcoleDirecteEvent, EventMetadata)> {
        self.rx.try_recv().ok()
    }

    /// Drain every event currently buffered.
    pub fn drain(&mut self) -> Vec<EcoleDirecteEvent> {
        let mut events = Vec::new();
        while let Some((event, _)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            EcoleDirecteEvent::new("Marie Dupont", "new_grade", serde_json::json!({})),
            "coordinator",
        );
        assert!(delivered);

        let (event, meta) = rx.recv().await.unwrap();
        assert_eq!(event.kind, "new_grade");
        assert_eq!(meta.source, "coordinator");
    }

    #[test]
    fn test_publish_without_subscriber() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.publish(
            EcoleDirecteEvent::new("", "new_formulaires", serde_json::json!({})),
            "coordinator"
        ));
    }

    #[test]
    fn test_drain() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        for kind in ["new_absence", "new_retard"] {
            bus.publish(EcoleDirecteEvent::new("", kind, serde_json::json!({})), "test");
        }
        let events = rx.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, "new_retard");
        assert!(rx.drain().is_empty());
    }
}
