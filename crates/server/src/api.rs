use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::bootstrap::AppState;
use crate::{bot, leads, webhook};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        .route("/api/leads/{id}/messages", post(leads::send_message))
        .route("/api/leads/{id}/pause", post(leads::set_paused))
        .route("/api/ai/suggest", post(leads::suggest))
        .route("/api/bot/status", get(bot::status))
        .route("/api/bot/logout", post(bot::logout))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;
    use crate::bootstrap::test_support::context;

    #[tokio::test]
    async fn webhook_message_flows_through_the_router() {
        let ctx = context();
        let app = router(ctx.state.clone());

        let body = json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "5519999990000", "id": "wamid.1", "text": {"body": "oi"}}
            ]}}]}]
        });
        let response = app
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&bytes[..], b"EVENT_RECEIVED");
        assert!(!ctx.sender.sent().is_empty());
        assert!(ctx.sender.sent().iter().all(|sent| sent.to == "5519999990000"));
    }

    #[tokio::test]
    async fn bot_status_without_bridge_reports_not_ready() {
        let ctx = context();

        let response = router(ctx.state)
            .oneshot(Request::get("/api/bot/status").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload, json!({"ready": false, "qrCode": ""}));
    }

    #[tokio::test]
    async fn unknown_lead_route_returns_not_found_json() {
        let ctx = context();

        let response = router(ctx.state)
            .oneshot(
                Request::post("/api/leads/missing/pause")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"paused":true}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload, json!({"error": "Lead not found"}));
    }
}
