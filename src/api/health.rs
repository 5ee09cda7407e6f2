use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe: one database round trip, no retry.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    match state.health_service.check_db().await {
        Ok(()) => {
            let response = HealthResponse { status: "ok".to_string(), database: "ok".to_string(), error: None };
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            tracing::warn!(error = %e, component = "database", "Readiness probe failed");
            let response =
                HealthResponse { status: "error".to_string(), database: "error".to_string(), error: Some(e) };
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}
