//! Liveness and readiness probes. Not on the data-plane path; carried
//! because every deployment of this service needs them regardless of the
//! data-plane scope.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub service: String,
    pub live_broker_connections: usize,
}

/// Liveness probe: always `200` once the process is accepting connections.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: state.config().service.name.clone(),
        }),
    )
}

/// Readiness probe: `200` once at least one broker client has been
/// established, `503` otherwise (the service has nothing proven reachable
/// yet; it may simply not have served a request).
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let live = state.clients().len();
    let status = if live > 0 { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadinessResponse {
            ready: live > 0,
            service: state.config().service.name.clone(),
            live_broker_connections: live,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse as _;

    #[tokio::test]
    async fn health_is_always_ok() {
        let state = AppState::new(crate::config::Config::default());
        let resp = health(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_is_unavailable_with_no_live_clients() {
        let state = AppState::new(crate::config::Config::default());
        let resp = readiness(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
