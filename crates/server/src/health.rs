use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use vendaflow_db::DbPool;
use vendaflow_whatsapp::BridgeStatus;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    bridge: Option<BridgeStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub whatsapp_bridge: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, bridge: Option<BridgeStatus>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, bridge })
}

/// Readiness hinges on the database only; an unpaired bridge is reported
/// but does not degrade the service.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let whatsapp_bridge = bridge_check(state.bridge.as_ref()).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "vendaflow-server runtime initialized".to_string(),
        },
        database,
        whatsapp_bridge,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn bridge_check(bridge: Option<&BridgeStatus>) -> HealthCheck {
    let Some(bridge) = bridge else {
        return HealthCheck { status: "disabled", detail: "bridge not configured".to_string() };
    };
    let snapshot = bridge.snapshot().await;
    if snapshot.ready {
        HealthCheck { status: "ready", detail: "session paired".to_string() }
    } else if !snapshot.qr_code.is_empty() {
        HealthCheck { status: "pairing", detail: "waiting for QR scan".to_string() }
    } else {
        HealthCheck { status: "connecting", detail: "no session yet".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use vendaflow_db::connect_with_settings;
    use vendaflow_whatsapp::BridgeStatus;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_database_is_reachable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), bridge: None })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.whatsapp_bridge.status, "disabled");

        pool.close().await;
    }

    #[tokio::test]
    async fn unpaired_bridge_does_not_degrade_health() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) = health(State(HealthState {
            db_pool: pool.clone(),
            bridge: Some(BridgeStatus::default()),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.whatsapp_bridge.status, "connecting");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) = health(State(HealthState { db_pool: pool, bridge: None })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
