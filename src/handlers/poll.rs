//! Batch poll handler: short-poll `GET` returning accumulated messages as a
//! JSON array.

use std::collections::HashMap;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::error::Result;
use crate::handlers::{authorize_topic, RouteVars};
use crate::resolver::{consumer_params, resolve_receiver, topic_from_route};
use crate::state::AppState;

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_PER_MESSAGE_TIMEOUT_MS: u64 = 300;

/// `GET /v2/poll/{persistent}/{tenant}/{namespace}/{topic}`.
pub async fn poll(
    State(state): State<AppState>,
    Path(vars): Path<RouteVars>,
    Query(query): Query<HashMap<String, String>>,
    headers: axum::http::HeaderMap,
) -> Result<Response> {
    let (token, broker_url) = resolve_receiver(&headers, state.config())?;

    let route_vars = HashMap::from([
        ("persistent".to_string(), vars.persistent),
        ("tenant".to_string(), vars.tenant),
        ("namespace".to_string(), vars.namespace),
        ("topic".to_string(), vars.topic),
    ]);
    let addr = topic_from_route(&route_vars, &headers, state.config())?;
    authorize_topic(&addr, &token, state.config())?;

    let params = consumer_params(&query)?;

    let batch_size = query
        .get("batchSize")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_BATCH_SIZE);
    let per_msg_timeout_ms = query
        .get("perMessageTimeoutMs")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_PER_MESSAGE_TIMEOUT_MS);

    let messages = state
        .consumers()
        .poll_batch(
            &broker_url,
            &token,
            &addr.fqn(),
            &params.sub_name,
            params.sub_type,
            batch_size,
            Duration::from_millis(per_msg_timeout_ms),
        )
        .await?;

    if messages.is_empty() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Json(messages).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_batch_and_timeout_constants_match_contract() {
        assert_eq!(DEFAULT_BATCH_SIZE, 10);
        assert_eq!(DEFAULT_PER_MESSAGE_TIMEOUT_MS, 300);
    }
}
