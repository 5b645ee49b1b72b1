use axum::routing::{get, post};
use axum::Router;

use pulsar_beam::config::Config;
use pulsar_beam::error::Result;
use pulsar_beam::handlers::{ingestion, poll, sse};
use pulsar_beam::health::{health, readiness};
use pulsar_beam::observability::init_tracing;
use pulsar_beam::server::Server;
use pulsar_beam::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    tracing::info!(
        service = %config.service.name,
        port = config.service.port,
        "starting pulsar-beam"
    );

    let state = AppState::new(config.clone());

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/readyz", get(readiness))
        .route("/v2/firehose/{persistent}/{tenant}/{namespace}/{topic}", post(ingestion::ingest))
        .route("/v2/sse/{persistent}/{tenant}/{namespace}/{topic}", get(sse::stream))
        .route("/v2/poll/{persistent}/{tenant}/{namespace}/{topic}", get(poll::poll))
        .with_state(state);

    Server::new(config).serve(app).await
}
