//! Dispatcher fed from a live event bus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ecoledirecte_core::{kinds, EcoleDirecteEvent, EventBus, EventMetadata};
use ecoledirecte_notify::{Dispatcher, Error, EventSink, MemorySink, Result};
use serde_json::json;

/// Sink that always fails.
struct BrokenSink;

#[async_trait]
impl EventSink for BrokenSink {
    fn name(&self) -> &str {
        "broken"
    }

    fn sink_type(&self) -> &str {
        "test"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, _event: &EcoleDirecteEvent, _metadata: &EventMetadata) -> Result<()> {
        Err(Error::SendFailed("unreachable".into()))
    }
}

/// Sink that takes a while per event, like a remote webhook.
#[derive(Default)]
struct SlowSink {
    delivered: AtomicUsize,
}

#[async_trait]
impl EventSink for SlowSink {
    fn name(&self) -> &str {
        "slow"
    }

    fn sink_type(&self) -> &str {
        "test"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, _event: &EcoleDirecteEvent, _metadata: &EventMetadata) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn wait_for(sink: &MemorySink, count: usize) {
    for _ in 0..100 {
        if sink.count().await >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_forwards_bus_events_in_order() {
    let bus = EventBus::new();
    let memory = MemorySink::new("memory");
    let handle = Dispatcher::new()
        .with_sink(Arc::new(BrokenSink))
        .with_sink(Arc::new(memory.clone()))
        .spawn(&bus);

    bus.publish(
        EcoleDirecteEvent::new("Marie Dupont", kinds::NEW_GRADE, json!({"comment": "Contrôle"})),
        "coordinator",
    );
    bus.publish(EcoleDirecteEvent::new_qcm("jdupont", "Quelle est votre ville ?"), "auth");

    wait_for(&memory, 2).await;
    let received = memory.received().await;
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].0.kind, kinds::NEW_GRADE);
    assert_eq!(received[0].1.source, "coordinator");
    assert!(received[1].0.is_qcm());
    assert_eq!(received[1].1.source, "auth");

    drop(bus);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_handle_completes_after_queued_events_are_delivered() {
    let bus = EventBus::new();
    let slow = Arc::new(SlowSink::default());
    let handle = Dispatcher::new().with_sink(slow.clone()).spawn(&bus);

    bus.publish(EcoleDirecteEvent::new_qcm("jdupont", "Quelle est votre ville ?"), "auth");
    bus.publish(
        EcoleDirecteEvent::new("Marie Dupont", kinds::NEW_FORM, json!({})),
        "coordinator",
    );
    drop(bus);

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slow.delivered.load(Ordering::SeqCst), 2);
}
