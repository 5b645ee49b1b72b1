//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds normative per the data-plane error-handling contract.
#[derive(Debug, Error)]
pub enum Error {
    /// Route variables missing or unparsable.
    #[error("Bad route: {0}")]
    BadRoute(String),

    /// Topic FQN failed to build (empty component, bad persistence token).
    #[error("Bad topic: {0}")]
    BadTopic(String),

    /// Subscription name shorter than the minimum, or otherwise invalid.
    #[error("Bad subscription name: {0}")]
    BadSubName(String),

    /// Token missing, malformed, or rejected by JWT verification.
    #[error("Authentication failed: {0}")]
    AuthFail(String),

    /// `PulsarUrl` header names a broker not on the allow-list.
    #[error("Unauthorized broker URL: {0}")]
    UnauthorizedUrl(String),

    /// Caller's subject is not authorized for the topic's tenant.
    #[error("Forbidden: subject not authorized for tenant {0}")]
    ForbiddenTenant(String),

    /// Broker unreachable or rejected the operation, on the produce path (503).
    #[error("Broker unavailable: {0}")]
    BrokerUnavailableProduce(String),

    /// Broker unreachable or rejected the operation, on the consume path (500,
    /// preserved historical distinction from the produce path).
    #[error("Broker unavailable: {0}")]
    BrokerUnavailableConsume(String),

    /// Body read or gzip decode failure.
    #[error("I/O error: {0}")]
    IoFail(#[from] std::io::Error),

    /// Framed payload exceeded the worker buffer capacity.
    #[error("Buffer overflow")]
    BufferOverflow,

    /// Config load/validation failure.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// JWT verification plumbing failure distinct from a rejected token.
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Anything else (serialization, unreachable states).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body, `{"error": "<message>"}` per the error-handling contract.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::BadRoute(_) | Error::BadTopic(_) | Error::BadSubName(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::AuthFail(_) | Error::UnauthorizedUrl(_) => StatusCode::UNAUTHORIZED,
            Error::ForbiddenTenant(_) => StatusCode::FORBIDDEN,
            Error::BrokerUnavailableProduce(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::BrokerUnavailableConsume(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::IoFail(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BufferOverflow => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) | Error::Jwt(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_route_maps_to_422() {
        let err = Error::BadRoute("missing tenant".into());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn broker_unavailable_differs_by_path() {
        let produce = Error::BrokerUnavailableProduce("down".into());
        assert_eq!(produce.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let consume = Error::BrokerUnavailableConsume("down".into());
        assert_eq!(consume.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn buffer_overflow_message_is_literal() {
        let err = Error::BufferOverflow;
        assert_eq!(err.to_string(), "Buffer overflow");
    }
}
