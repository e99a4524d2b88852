use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vendaflow_core::config::BridgeConfig;
use vendaflow_core::delivery::MessageSender;

use crate::events::{Channel, InboundHandler, InboundMessage};

const STATUS_BROADCAST: &str = "status@broadcast";
const GROUP_SUFFIX: &str = "@g.us";
const CONTACT_SUFFIX: &str = "@c.us";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("bridge failed to start: {0}")]
    Start(String),
    #[error("bridge read failed: {0}")]
    Receive(String),
    #[error("bridge send failed: {0}")]
    Send(String),
    #[error("bridge logout failed: {0}")]
    Logout(String),
    #[error("bridge session disconnected: {0}")]
    Disconnected(String),
}

/// Session lifecycle and traffic reported by a WhatsApp Web session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    Qr(String),
    Authenticated,
    Ready,
    Disconnected(String),
    Message { from: String, body: String },
}

/// A WhatsApp Web session driven outside this process.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Starts a session, replacing any running one.
    async fn initialize(&self) -> Result<(), BridgeError>;
    /// `Ok(None)` once the session has ended for good.
    async fn next_event(&self) -> Result<Option<BridgeEvent>, BridgeError>;
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), BridgeError>;
    /// Unpairs the phone and starts pairing again within the same session.
    async fn logout(&self) -> Result<(), BridgeError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSnapshot {
    pub ready: bool,
    /// Latest pairing code, empty once the session is ready.
    pub qr_code: String,
}

/// Connection state shared between the runner and the HTTP status endpoint.
#[derive(Clone, Default)]
pub struct BridgeStatus {
    inner: Arc<RwLock<BridgeSnapshot>>,
}

impl BridgeStatus {
    pub async fn snapshot(&self) -> BridgeSnapshot {
        self.inner.read().await.clone()
    }

    async fn set_qr(&self, code: String) {
        let mut state = self.inner.write().await;
        state.qr_code = code;
        state.ready = false;
    }

    async fn set_ready(&self) {
        let mut state = self.inner.write().await;
        state.qr_code.clear();
        state.ready = true;
    }

    async fn clear(&self) {
        *self.inner.write().await = BridgeSnapshot::default();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 10, base_delay_ms: 1_000, max_delay_ms: 30_000 }
    }
}

impl From<&BridgeConfig> for ReconnectPolicy {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Messages from status broadcasts and groups never reach the engine.
pub fn is_ignored_chat(chat_id: &str) -> bool {
    chat_id == STATUS_BROADCAST || chat_id.contains(GROUP_SUFFIX)
}

pub fn phone_from_chat_id(chat_id: &str) -> &str {
    chat_id.split('@').next().unwrap_or(chat_id)
}

pub fn chat_id_for(phone_number: &str) -> String {
    if phone_number.contains('@') {
        phone_number.to_string()
    } else {
        format!("{phone_number}{CONTACT_SUFFIX}")
    }
}

/// Replies through the bridge session the message arrived on.
#[derive(Clone)]
pub struct BridgeSender {
    client: Arc<dyn BridgeClient>,
}

impl BridgeSender {
    pub fn new(client: Arc<dyn BridgeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageSender for BridgeSender {
    async fn send(&self, to: &str, text: &str) {
        if let Err(send_error) = self.client.send_text(&chat_id_for(to), text).await {
            warn!(
                event_name = "delivery.bridge.failed",
                phone = to,
                error = %send_error,
                "error sending bridge message"
            );
        }
    }
}

enum SessionEnd {
    Closed,
    Disconnected { reason: String, was_ready: bool },
}

pub struct BridgeRunner {
    client: Arc<dyn BridgeClient>,
    handler: Arc<dyn InboundHandler>,
    status: BridgeStatus,
    reconnect_policy: ReconnectPolicy,
}

impl BridgeRunner {
    pub fn new(
        client: Arc<dyn BridgeClient>,
        handler: Arc<dyn InboundHandler>,
        status: BridgeStatus,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { client, handler, status, reconnect_policy }
    }

    pub fn status(&self) -> &BridgeStatus {
        &self.status
    }

    /// Logs the paired phone out. The client re-pairs and reports a new QR code.
    pub async fn logout(&self) -> Result<(), BridgeError> {
        self.client.logout().await?;
        self.status.clear().await;
        info!(event_name = "ingress.bridge.logged_out", "bridge session logged out");
        Ok(())
    }

    /// Runs sessions until the client closes its stream or retries run out.
    /// A session that reached ready resets the retry budget.
    pub async fn start(&self) {
        let mut attempt = 0;
        loop {
            let failure = match self.run_session(attempt).await {
                Ok(SessionEnd::Closed) => {
                    info!(event_name = "ingress.bridge.closed", "bridge event stream closed");
                    self.status.clear().await;
                    return;
                }
                Ok(SessionEnd::Disconnected { reason, was_ready }) => {
                    if was_ready {
                        attempt = 0;
                    }
                    BridgeError::Disconnected(reason)
                }
                Err(bridge_error) => bridge_error,
            };

            self.status.clear().await;
            warn!(
                event_name = "ingress.bridge.session_failed",
                attempt,
                max_retries = self.reconnect_policy.max_retries,
                error = %failure,
                "bridge session ended"
            );

            if attempt >= self.reconnect_policy.max_retries {
                warn!(
                    event_name = "ingress.bridge.retries_exhausted",
                    max_retries = self.reconnect_policy.max_retries,
                    "bridge retries exhausted; continuing process without crash"
                );
                return;
            }

            let delay = self.reconnect_policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn run_session(&self, attempt: u32) -> Result<SessionEnd, BridgeError> {
        info!(event_name = "ingress.bridge.initializing", attempt, "starting bridge session");
        self.client.initialize().await?;
        let sender = BridgeSender::new(self.client.clone());
        let mut was_ready = false;

        loop {
            let Some(event) = self.client.next_event().await? else {
                return Ok(SessionEnd::Closed);
            };

            match event {
                BridgeEvent::Qr(code) => {
                    info!(event_name = "ingress.bridge.qr", "new pairing code available");
                    self.status.set_qr(code).await;
                }
                BridgeEvent::Authenticated => {
                    info!(event_name = "ingress.bridge.authenticated", "bridge authenticated");
                }
                BridgeEvent::Ready => {
                    info!(event_name = "ingress.bridge.ready", "bridge online and ready");
                    was_ready = true;
                    self.status.set_ready().await;
                }
                BridgeEvent::Disconnected(reason) => {
                    return Ok(SessionEnd::Disconnected { reason, was_ready });
                }
                BridgeEvent::Message { from, body } => {
                    self.dispatch(&from, body, &sender).await;
                }
            }
        }
    }

    async fn dispatch(&self, chat_id: &str, body: String, sender: &BridgeSender) {
        if is_ignored_chat(chat_id) || body.is_empty() {
            debug!(event_name = "ingress.bridge.message_ignored", chat_id, "skipping message");
            return;
        }

        let message = InboundMessage {
            phone_number: phone_from_chat_id(chat_id).to_string(),
            text: body,
            channel: Channel::Bridge,
            correlation_id: format!("bridge-{}", phone_from_chat_id(chat_id)),
        };
        info!(
            event_name = "ingress.bridge.message_received",
            phone = %message.phone_number,
            correlation_id = %message.correlation_id,
            "received bridge message"
        );

        if let Err(handler_error) = self.handler.handle_inbound(&message, sender).await {
            warn!(
                event_name = "ingress.bridge.handler_failed",
                phone = %message.phone_number,
                correlation_id = %message.correlation_id,
                error = %handler_error,
                "message handling failed; continuing bridge loop"
            );
        }
    }
}
