//! The Ecole Directe API client.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use ecoledirecte_core::{Config, EventBus, Result, Session};

use crate::envelope::Envelope;
use crate::qcm::QcmStore;
use crate::recorder::DebugRecorder;
use crate::transport::{ApiRequest, ReqwestTransport, Transport};

/// Client bound to one account.
///
/// Login lives in [`crate::auth`], the resource fetchers in
/// [`crate::resources`].
#[derive(Clone)]
pub struct EdClient {
    pub(crate) config: Arc<Config>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) qcm: QcmStore,
    pub(crate) events: EventBus,
    pub(crate) recorder: DebugRecorder,
}

impl EdClient {
    /// Client talking to the real API over HTTPS.
    pub fn new(config: Config, events: EventBus) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        let qcm = QcmStore::new(config.qcm_file.clone());
        Ok(Self::with_transport(config, transport, qcm, events))
    }

    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
        qcm: QcmStore,
        events: EventBus,
    ) -> Self {
        let recorder = DebugRecorder::new(config.debug_dir.clone());
        Self {
            config: Arc::new(config),
            transport,
            qcm,
            events,
            recorder,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn qcm_store(&self) -> &QcmStore {
        &self.qcm
    }

    /// Send one call and validate its envelope.
    ///
    /// `label` names the debug dump of the response.
    pub(crate) async fn call(
        &self,
        label: &str,
        path: &str,
        payload: Value,
        token: Option<&str>,
    ) -> Result<Envelope> {
        let url = self.config.api.endpoint(path);
        let mut request = ApiRequest::new(url.clone(), payload);
        if let Some(token) = token {
            request = request.with_token(token);
        }

        debug!(category = "http", label, url = %url, "Calling API");
        let body = self.transport.send(&request).await?;
        self.recorder.record(label, &body);
        Envelope::parse(&url, &body, token.is_some())
    }

    /// Authenticated call; the session picks up a rotated token.
    pub(crate) async fn call_with_session(
        &self,
        session: &mut Session,
        label: &str,
        path: &str,
        payload: Value,
    ) -> Result<Envelope> {
        let envelope = self
            .call(label, path, payload, Some(session.token.as_str()))
            .await?;
        session.update_token(envelope.token());
        Ok(envelope)
    }
}

impl std::fmt::Debug for EdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdClient")
            .field("username", &self.config.username)
            .field("api", &self.config.api.url)
            .field("qcm", &self.qcm.path())
            .finish()
    }
}
