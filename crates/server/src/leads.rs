use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use vendaflow_agent::EngineError;
use vendaflow_core::domain::lead::{Lead, LeadId};
use vendaflow_core::errors::{ApplicationError, InterfaceError};

use crate::api::{api_error, ApiError};
use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub author: &'static str,
    pub text: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadView {
    pub id: String,
    pub phone_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: String,
    pub stage: String,
    pub bot_paused: bool,
    pub last_interaction: String,
    pub history: Vec<HistoryView>,
}

impl From<Lead> for LeadView {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id.0,
            phone_number: lead.phone_number,
            name: lead.name,
            email: lead.email,
            status: lead.status,
            stage: lead.stage.as_str().to_string(),
            bot_paused: lead.bot_paused,
            last_interaction: lead.last_interaction.to_rfc3339(),
            history: lead
                .history
                .into_iter()
                .map(|entry| HistoryView {
                    author: entry.author.as_str(),
                    text: entry.text,
                    timestamp: entry.timestamp.to_rfc3339(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseResponse {
    pub success: bool,
    pub bot_paused: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SuggestRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SuggestResponse {
    pub suggestion: String,
}

/// Maps an engine failure onto a status code. Not-found and validation
/// failures carry their own message; everything else gets `fallback`.
fn engine_error(
    failure: EngineError,
    operation: &'static str,
    not_found: &'static str,
    fallback: &'static str,
) -> ApiError {
    let interface = ApplicationError::from(failure).into_interface(operation);
    match interface {
        InterfaceError::NotFound { .. } => api_error(StatusCode::NOT_FOUND, not_found),
        InterfaceError::BadRequest { .. } => api_error(StatusCode::BAD_REQUEST, "Text is required"),
        InterfaceError::ServiceUnavailable { ref message, .. }
        | InterfaceError::Internal { ref message, .. } => {
            error!(
                event_name = "system.api.request_failed",
                correlation_id = interface.correlation_id(),
                error = %message,
                "agent operation failed"
            );
            api_error(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}

/// `POST /api/leads/{id}/messages {text}`: manual agent send.
pub async fn send_message(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<LeadView>, ApiError> {
    let text = body.get("text").and_then(Value::as_str).unwrap_or_default();
    if text.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text is required"));
    }

    state
        .engine
        .send_agent_message(&LeadId(id), text)
        .await
        .map(|lead| Json(LeadView::from(lead)))
        .map_err(|failure| {
            engine_error(failure, "api.lead_message", "Lead not found", "Failed to send message")
        })
}

/// `POST /api/leads/{id}/pause {paused}`. Anything but a literal `true`
/// resumes the bot.
pub async fn set_paused(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<PauseResponse>, ApiError> {
    let paused = body.get("paused").and_then(Value::as_bool) == Some(true);

    state
        .engine
        .set_bot_paused(&LeadId(id), paused)
        .await
        .map(|lead| Json(PauseResponse { success: true, bot_paused: lead.bot_paused }))
        .map_err(|failure| engine_error(failure, "api.lead_pause", "Lead not found", "Failed"))
}

/// `POST /api/ai/suggest {id}`: drafts a reply for the agent.
pub async fn suggest(
    State(state): State<AppState>,
    Json(body): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let id = body.id.unwrap_or_default();

    state
        .engine
        .suggest_reply(&LeadId(id))
        .await
        .map(|suggestion| Json(SuggestResponse { suggestion }))
        .map_err(|failure| {
            engine_error(failure, "api.ai_suggest", "Lead não encontrado", "Erro ao gerar sugestão")
        })
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        Json,
    };
    use serde_json::json;

    use vendaflow_core::domain::lead::Author;
    use vendaflow_db::repositories::LeadRepository;

    use super::{send_message, set_paused, suggest, SuggestRequest};
    use crate::bootstrap::test_support::{context, TestContext};

    async fn lead_id(ctx: &TestContext) -> String {
        ctx.state.engine.process("5519999990000", "oi").await.expect("process").lead_id.0
    }

    #[tokio::test]
    async fn agent_message_is_delivered_and_pauses_bot() {
        let ctx = context();
        let id = lead_id(&ctx).await;
        let sent_before = ctx.sender.sent().len();

        let Json(view) = send_message(
            Path(id.clone()),
            State(ctx.state.clone()),
            Json(json!({"text": "Aqui é o Carlos, posso ajudar?"})),
        )
        .await
        .expect("should succeed");

        assert!(view.bot_paused);
        assert_eq!(view.history.last().map(|entry| entry.author), Some("agent"));
        let sent = ctx.sender.sent();
        assert_eq!(sent.len(), sent_before + 1);
        assert_eq!(sent[sent_before].text, "Aqui é o Carlos, posso ajudar?");

        let stored = ctx.leads.find_by_phone("5519999990000").await.expect("lookup").expect("lead");
        assert!(stored.bot_paused);
        assert_eq!(stored.history.last().map(|entry| entry.author), Some(Author::Agent));
    }

    #[tokio::test]
    async fn agent_message_requires_text() {
        let ctx = context();
        let id = lead_id(&ctx).await;

        for body in [json!({}), json!({"text": ""}), json!({"text": "   "}), json!({"text": 42})] {
            let (status, Json(error)) =
                send_message(Path(id.clone()), State(ctx.state.clone()), Json(body))
                    .await
                    .expect_err("should be rejected");
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error.error, "Text is required");
        }
    }

    #[tokio::test]
    async fn agent_message_to_unknown_lead_is_not_found() {
        let ctx = context();

        let (status, Json(error)) =
            send_message(Path("LEAD-missing".to_string()), State(ctx.state), Json(json!({"text": "Olá"})))
                .await
                .expect_err("unknown lead");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Lead not found");
        assert!(ctx.sender.sent().is_empty());
    }

    #[tokio::test]
    async fn pause_accepts_only_literal_true() {
        let ctx = context();
        let id = lead_id(&ctx).await;

        let Json(paused) =
            set_paused(Path(id.clone()), State(ctx.state.clone()), Json(json!({"paused": true})))
                .await
                .expect("pause");
        assert!(paused.success);
        assert!(paused.bot_paused);

        let Json(resumed) =
            set_paused(Path(id.clone()), State(ctx.state.clone()), Json(json!({"paused": "true"})))
                .await
                .expect("resume");
        assert!(!resumed.bot_paused);

        let stored = ctx.leads.find_by_phone("5519999990000").await.expect("lookup").expect("lead");
        assert!(!stored.bot_paused);
    }

    #[tokio::test]
    async fn suggestion_returns_responder_text() {
        let ctx = context();
        let id = lead_id(&ctx).await;

        let Json(response) =
            suggest(State(ctx.state.clone()), Json(SuggestRequest { id: Some(id) }))
                .await
                .expect("suggestion");

        assert_eq!(response.suggestion, "Sugestão: ofereça uma visita ao showroom.");
    }

    #[tokio::test]
    async fn suggestion_for_unknown_lead_is_not_found() {
        let ctx = context();

        let (status, Json(error)) = suggest(State(ctx.state), Json(SuggestRequest { id: None }))
            .await
            .expect_err("unknown lead");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.error, "Lead não encontrado");
    }
}
