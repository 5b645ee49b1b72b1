//! SSE streaming handler: forwards broker messages to the client as
//! `id:`/`data:` frames, acking each message before it is flushed.
//!
//! The broker consumer is driven by a background task rather than inline in
//! the response stream, so that client disconnect (the channel closing) and
//! broker exhaustion can both be observed with a single `select!` without
//! polling either side.

use std::collections::HashMap;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tokio::sync::mpsc;

use crate::broker::{to_consumed, OpenConsumer};
use crate::error::Result;
use crate::handlers::{authorize_topic, RouteVars};
use crate::resolver::{consumer_params, resolve_receiver, topic_from_route};
use crate::sse::Sse;
use crate::state::AppState;

type SseItem = std::result::Result<Event, Infallible>;

/// Drives the broker consumer until the client disconnects (the channel
/// closes) or the broker's message channel ends.
async fn forward_messages(open: &mut OpenConsumer, tx: &mpsc::Sender<SseItem>) {
    loop {
        tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("sse client disconnected");
                return;
            }
            next = open.next() => {
                let Some(next) = next else {
                    tracing::debug!("sse broker channel closed");
                    return;
                };
                let raw = match next {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::error!(error = %e, "sse consumer error");
                        return;
                    }
                };
                if let Err(e) = open.ack(&raw).await {
                    tracing::error!(error = %e, "sse ack failed");
                    return;
                }

                let consumed = to_consumed(&raw);
                let event = Event::default()
                    .id(consumed.id)
                    .data(String::from_utf8_lossy(&consumed.payload).into_owned());

                if tx.send(Ok(event)).await.is_err() {
                    tracing::debug!("sse client disconnected mid-send");
                    return;
                }
            }
        }
    }
}

/// `GET /v2/sse/{persistent}/{tenant}/{namespace}/{topic}`.
pub async fn stream(
    State(state): State<AppState>,
    Path(vars): Path<RouteVars>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
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

    let mut open = state
        .consumers()
        .open(
            &broker_url,
            &token,
            &addr.fqn(),
            &params.sub_name,
            params.sub_type,
            params.init_pos,
        )
        .await?;

    let (tx, rx) = mpsc::channel::<SseItem>(16);

    tokio::spawn(async move {
        let panicked = AssertUnwindSafe(forward_messages(&mut open, &tx)).catch_unwind().await.is_err();
        if panicked {
            tracing::error!("sse forwarding task panicked, recovering");
        }
        if let Err(e) = open.close().await {
            tracing::warn!(error = %e, "sse consumer close failed");
        }
        tracing::info!("sse stream exit");
    });

    let event_stream = futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });

    let mut response = Sse::new(event_stream).keep_alive(KeepAlive::default()).into_response();
    let out_headers = response.headers_mut();
    out_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    out_headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    out_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    Ok(response)
}
