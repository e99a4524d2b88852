use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::events::{Channel, InboundMessage};

pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";
pub const SUBSCRIBE_MODE: &str = "subscribe";
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Cloud API webhook notification. Only the path down to the first text
/// message is modelled; everything else is ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: Option<String>,
    pub id: Option<String>,
    pub text: Option<TextBody>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextBody {
    pub body: Option<String>,
}

impl WebhookPayload {
    pub fn is_business_account(&self) -> bool {
        self.object.as_deref() == Some(BUSINESS_ACCOUNT_OBJECT)
    }

    /// The first message of the first change of the first entry, when it has
    /// both a sender and a non-empty text body.
    pub fn first_message(&self) -> Option<InboundMessage> {
        let message = self.entry.first()?.changes.first()?.value.messages.first()?;
        let from = message.from.as_deref().filter(|from| !from.is_empty())?;
        let text = message.text.as_ref()?.body.as_deref().filter(|body| !body.is_empty())?;

        Some(InboundMessage {
            phone_number: from.to_string(),
            text: text.to_string(),
            channel: Channel::CloudApi,
            correlation_id: message.id.clone().unwrap_or_else(|| format!("wa-{from}")),
        })
    }
}

/// Query parameters of the subscription handshake.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerificationQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified { challenge: String },
    Forbidden,
    MissingParameters,
}

pub fn verify_subscription(query: &VerificationQuery, expected_token: &str) -> VerificationOutcome {
    let mode = query.mode.as_deref().filter(|mode| !mode.is_empty());
    let token = query.verify_token.as_deref().filter(|token| !token.is_empty());
    let (Some(mode), Some(token)) = (mode, token) else {
        return VerificationOutcome::MissingParameters;
    };

    if mode == SUBSCRIBE_MODE && token == expected_token {
        VerificationOutcome::Verified { challenge: query.challenge.clone().unwrap_or_default() }
    } else {
        VerificationOutcome::Forbidden
    }
}

/// Checks the `X-Hub-Signature-256` header (`sha256=<hex hmac>`) against the
/// raw request body.
pub fn verify_signature(app_secret: &str, signature_header: Option<&str>, body: &[u8]) -> bool {
    let signature = signature_header.unwrap_or("").trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature).trim();
    if signature.is_empty() {
        return false;
    }
    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}
