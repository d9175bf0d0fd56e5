//! Log sink.

use async_trait::async_trait;
use tracing::{info, warn};

use ecoledirecte_core::{EcoleDirecteEvent, EventMetadata};

use super::EventSink;
use crate::{Error, Result};

/// Writes every event through `tracing`.
///
/// A new QCM question is logged as a warning naming the answer file, since
/// logins keep failing until someone fills it in.
#[derive(Debug, Clone)]
pub struct LogSink {
    name: String,
    enabled: bool,
    qcm_file: Option<String>,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            qcm_file: None,
        }
    }

    /// Name the answer file in QCM warnings.
    pub fn with_qcm_file(mut self, path: impl Into<String>) -> Self {
        self.qcm_file = Some(path.into());
        self
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        "log"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, event: &EcoleDirecteEvent, metadata: &EventMetadata) -> Result<()> {
        if !self.enabled {
            return Err(Error::SinkDisabled(self.name.clone()));
        }

        if event.is_qcm() {
            let question = event.data.get("question").and_then(|q| q.as_str()).unwrap_or("");
            warn!(
                category = "notify",
                question,
                qcm_file = self.qcm_file.as_deref().unwrap_or("-"),
                "New double authentication question, add its answer to the QCM file"
            );
            return Ok(());
        }

        info!(
            category = "notify",
            event_id = %metadata.id,
            source = %metadata.source,
            kind = %event.kind,
            child = %event.child_name,
            data = %event.data,
            "Ecole Directe event"
        );
        Ok(())
    }

    fn get_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "qcm_file": self.qcm_file,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoledirecte_core::kinds;

    #[tokio::test]
    async fn test_log_sink() {
        let sink = LogSink::new("log").with_qcm_file("qcm.json");
        let event = EcoleDirecteEvent::new("Marie Dupont", kinds::NEW_GRADE, serde_json::json!({}));
        sink.send(&event, &EventMetadata::new("test")).await.unwrap();

        let qcm = EcoleDirecteEvent::new_qcm("jdupont", "Quel est votre mois de naissance ?");
        sink.send(&qcm, &EventMetadata::new("auth")).await.unwrap();
        assert_eq!(sink.get_config().unwrap()["qcm_file"], "qcm.json");
    }

    #[tokio::test]
    async fn test_log_sink_disabled() {
        let mut sink = LogSink::new("log");
        sink.disable();
        let event = EcoleDirecteEvent::new("", kinds::NEW_FORM, serde_json::json!({}));
        let result = sink.send(&event, &EventMetadata::new("test")).await;
        assert!(matches!(result, Err(Error::SinkDisabled(_))));
    }
}
