use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use vendaflow_whatsapp::BridgeSnapshot;

use crate::api::{api_error, ApiError};
use crate::bootstrap::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `GET /api/bot/status`: `{ready, qrCode}` of the local bridge.
pub async fn status(State(state): State<AppState>) -> Json<BridgeSnapshot> {
    Json(state.bridge_status.snapshot().await)
}

/// `POST /api/bot/logout`: unpairs the bridge so a new QR code is issued.
pub async fn logout(State(state): State<AppState>) -> Result<Json<LogoutResponse>, ApiError> {
    let Some(bridge) = state.bridge.as_ref() else {
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Client não iniciado."));
    };

    bridge.logout().await.map_err(|bridge_error| {
        error!(
            event_name = "ingress.bridge.logout_failed",
            error = %bridge_error,
            "bridge logout failed"
        );
        api_error(StatusCode::INTERNAL_SERVER_ERROR, bridge_error.to_string())
    })?;

    Ok(Json(LogoutResponse { success: true, message: "Desconectado e gerando novo QR" }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};

    use vendaflow_core::delivery::MessageSender;
    use vendaflow_whatsapp::{
        BridgeClient, BridgeError, BridgeEvent, BridgeRunner, BridgeStatus, InboundHandler,
        InboundHandlerError, InboundMessage, ReconnectPolicy,
    };

    use super::{logout, status};
    use crate::bootstrap::test_support::context;

    #[derive(Default)]
    struct LogoutClient {
        logouts: Mutex<u32>,
        fail: bool,
    }

    #[async_trait]
    impl BridgeClient for LogoutClient {
        async fn initialize(&self) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn next_event(&self) -> Result<Option<BridgeEvent>, BridgeError> {
            Ok(None)
        }

        async fn send_text(&self, _chat_id: &str, _text: &str) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn logout(&self) -> Result<(), BridgeError> {
            *self.logouts.lock().expect("logouts lock") += 1;
            if self.fail {
                Err(BridgeError::Logout("session already closed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct IgnoreHandler;

    #[async_trait]
    impl InboundHandler for IgnoreHandler {
        async fn handle_inbound(
            &self,
            _message: &InboundMessage,
            _sender: &dyn MessageSender,
        ) -> Result<(), InboundHandlerError> {
            Ok(())
        }
    }

    fn runner(client: Arc<LogoutClient>, status: BridgeStatus) -> Arc<BridgeRunner> {
        Arc::new(BridgeRunner::new(client, Arc::new(IgnoreHandler), status, ReconnectPolicy::default()))
    }

    #[tokio::test]
    async fn status_reports_default_snapshot() {
        let ctx = context();

        let Json(snapshot) = status(State(ctx.state)).await;

        assert!(!snapshot.ready);
        assert!(snapshot.qr_code.is_empty());
    }

    #[tokio::test]
    async fn logout_without_bridge_is_an_error() {
        let ctx = context();

        let (code, Json(body)) = logout(State(ctx.state)).await.expect_err("no bridge");

        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Client não iniciado.");
    }

    #[tokio::test]
    async fn logout_unpairs_the_bridge() {
        let mut ctx = context();
        let client = Arc::new(LogoutClient::default());
        ctx.state.bridge = Some(runner(client.clone(), ctx.state.bridge_status.clone()));

        let Json(response) = logout(State(ctx.state)).await.expect("logout");

        assert!(response.success);
        assert_eq!(response.message, "Desconectado e gerando novo QR");
        assert_eq!(*client.logouts.lock().expect("logouts lock"), 1);
    }

    #[tokio::test]
    async fn failed_logout_surfaces_as_server_error() {
        let mut ctx = context();
        let client = Arc::new(LogoutClient { fail: true, ..LogoutClient::default() });
        ctx.state.bridge = Some(runner(client, ctx.state.bridge_status.clone()));

        let (code, _) = logout(State(ctx.state)).await.expect_err("logout fails");

        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
