use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use vendaflow_core::config::WhatsAppConfig;
use vendaflow_core::delivery::MessageSender;
use vendaflow_core::domain::settings::keys;
use vendaflow_db::SettingsStore;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery client could not be built: {0}")]
    Build(String),
    #[error("whatsapp credentials missing")]
    MissingCredentials,
    #[error("delivery transport failure: {0}")]
    Transport(String),
    #[error("cloud api returned {status}: {body}")]
    Http { status: u16, body: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudCredentials {
    pub phone_number_id: String,
    pub access_token: String,
}

#[derive(Serialize)]
struct TextMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextPayload<'a>,
}

#[derive(Serialize)]
struct TextPayload<'a> {
    body: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessageId>,
}

#[derive(Debug, Deserialize)]
struct SentMessageId {
    id: String,
}

/// Sends plain text through the WhatsApp Cloud API.
///
/// Credentials are read from settings on every send, falling back to the
/// process configuration, so dashboard edits apply immediately.
#[derive(Clone)]
pub struct CloudApiSender {
    client: Client,
    settings: SettingsStore,
    graph_base_url: String,
    api_version: String,
}

impl CloudApiSender {
    pub fn new(config: &WhatsAppConfig, settings: SettingsStore) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| DeliveryError::Build(error.to_string()))?;

        Ok(Self {
            client,
            settings,
            graph_base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    pub async fn credentials(&self) -> Option<CloudCredentials> {
        let (phone_number_id, access_token) = match (
            self.settings.text(keys::WHATSAPP_PHONE_NUMBER_ID).await,
            self.settings.text(keys::WHATSAPP_ACCESS_TOKEN).await,
        ) {
            (Ok(phone_number_id), Ok(access_token)) => (phone_number_id, access_token),
            (Err(lookup_error), _) | (_, Err(lookup_error)) => {
                warn!(
                    event_name = "delivery.whatsapp.credentials_lookup_failed",
                    error = %lookup_error,
                    "falling back to configured credentials"
                );
                (
                    self.settings.default_text(keys::WHATSAPP_PHONE_NUMBER_ID),
                    self.settings.default_text(keys::WHATSAPP_ACCESS_TOKEN),
                )
            }
        };

        Some(CloudCredentials { phone_number_id: phone_number_id?, access_token: access_token? })
    }

    /// Sends one message and returns the provider message id when present.
    pub async fn deliver(&self, to: &str, text: &str) -> Result<Option<String>, DeliveryError> {
        let credentials = self.credentials().await.ok_or(DeliveryError::MissingCredentials)?;
        let url = format!(
            "{}/{}/{}/messages",
            self.graph_base_url, self.api_version, credentials.phone_number_id
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.access_token)
            .json(&TextMessageRequest {
                messaging_product: "whatsapp",
                to,
                kind: "text",
                text: TextPayload { body: text },
            })
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<unavailable>".into());
            return Err(DeliveryError::Http { status: status.as_u16(), body });
        }

        let body: SendResponse = response.json().await.unwrap_or_default();
        Ok(body.messages.into_iter().next().map(|message| message.id))
    }
}

#[async_trait]
impl MessageSender for CloudApiSender {
    async fn send(&self, to: &str, text: &str) {
        match self.deliver(to, text).await {
            Ok(message_id) => info!(
                event_name = "delivery.whatsapp.sent",
                phone = to,
                message_id = message_id.as_deref().unwrap_or("unknown"),
                "message sent"
            ),
            Err(DeliveryError::MissingCredentials) => error!(
                event_name = "delivery.whatsapp.credentials_missing",
                phone = to,
                "WhatsApp credentials missing"
            ),
            Err(delivery_error) => error!(
                event_name = "delivery.whatsapp.failed",
                phone = to,
                error = %delivery_error,
                "error sending WhatsApp message"
            ),
        }
    }
}
