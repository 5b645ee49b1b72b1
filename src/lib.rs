//! # pulsar-beam
//!
//! HTTP-facing bridge to a Pulsar-style pub/sub broker: a worker-pooled
//! ingestion path, a short-poll consume path, and an SSE streaming path,
//! fronted by tenant-scoped bearer-token authorization.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pulsar_beam::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone());
//!     let app = Router::new()
//!         .route("/healthz", get(health))
//!         .route("/readyz", get(readiness))
//!         .with_state(state);
//!
//!     Server::new(config).serve(app).await?;
//!     Ok(())
//! }
//! ```

pub mod authz;
pub mod broker;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod resolver;
pub mod server;
pub mod sse;
pub mod state;
pub mod topic;
pub mod worker_pool;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{MakeTypedRequestId, RequestId};
    pub use crate::middleware::{
        request_id_layer, request_id_propagation_layer, sensitive_headers_layer,
        RequestTrackingConfig, PROPAGATE_HEADERS, SENSITIVE_HEADERS,
    };
    pub use crate::observability::init_tracing;
    pub use crate::server::Server;
    pub use crate::state::AppState;

    pub use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, HeaderValue, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::get,
        Router,
    };

    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}
