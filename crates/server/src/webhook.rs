use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use vendaflow_core::domain::settings::keys;
use vendaflow_whatsapp::webhook::{
    verify_signature, verify_subscription, VerificationOutcome, VerificationQuery, WebhookPayload,
    EVENT_RECEIVED, SIGNATURE_HEADER,
};

use crate::bootstrap::AppState;

/// Subscription handshake. The expected token comes from settings, then the
/// configured default, else the empty string (which never matches).
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> (StatusCode, String) {
    let expected = match state.settings.text(keys::WHATSAPP_VERIFY_TOKEN).await {
        Ok(token) => token,
        Err(lookup_error) => {
            warn!(
                event_name = "ingress.webhook.verify_token_lookup_failed",
                error = %lookup_error,
                "falling back to configured verify token"
            );
            state.settings.default_text(keys::WHATSAPP_VERIFY_TOKEN)
        }
    }
    .unwrap_or_default();

    match verify_subscription(&query, &expected) {
        VerificationOutcome::Verified { challenge } => {
            info!(event_name = "ingress.webhook.verified", "webhook subscription verified");
            (StatusCode::OK, challenge)
        }
        VerificationOutcome::Forbidden => {
            warn!(event_name = "ingress.webhook.verify_rejected", "webhook verify token mismatch");
            (StatusCode::FORBIDDEN, String::new())
        }
        VerificationOutcome::MissingParameters => (StatusCode::BAD_REQUEST, String::new()),
    }
}

/// Message notifications. Processing completes before the response, so a
/// datastore failure surfaces as a 500 and the provider retries.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    if let Some(app_secret) = &state.app_secret {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
        if !verify_signature(app_secret.expose_secret(), signature, &body) {
            warn!(event_name = "ingress.webhook.signature_rejected", "invalid webhook signature");
            return (StatusCode::UNAUTHORIZED, String::new());
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(parse_error) => {
            warn!(
                event_name = "ingress.webhook.malformed",
                error = %parse_error,
                "webhook body is not valid JSON"
            );
            return (StatusCode::BAD_REQUEST, String::new());
        }
    };

    if !payload.is_business_account() {
        return (StatusCode::NOT_FOUND, String::new());
    }

    let Some(message) = payload.first_message() else {
        debug!(event_name = "ingress.webhook.no_text_message", "notification carries no text");
        return (StatusCode::OK, EVENT_RECEIVED.to_string());
    };

    info!(
        event_name = "ingress.webhook.message_received",
        correlation_id = %message.correlation_id,
        phone = %message.phone_number,
        "inbound WhatsApp message"
    );

    match state.engine.process(&message.phone_number, &message.text).await {
        Ok(_) => (StatusCode::OK, EVENT_RECEIVED.to_string()),
        Err(engine_error) => {
            error!(
                event_name = "ingress.webhook.processing_failed",
                correlation_id = %message.correlation_id,
                phone = %message.phone_number,
                error = %engine_error,
                "inbound message could not be processed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
