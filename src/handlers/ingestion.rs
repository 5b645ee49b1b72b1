//! Ingestion handler: frames an optional metadata prefix onto the request
//! body through a worker-pool buffer, then publishes the framed payload.

use std::collections::HashMap;
use std::io::Read;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Version};
use bytes::Bytes;
use flate2::read::GzDecoder;

use crate::error::Result;
use crate::handlers::{authorize_topic, RouteVars};
use crate::resolver::{resolve_receiver, topic_from_route};
use crate::state::AppState;
use crate::worker_pool::WorkerBuffer;

const CHUNK_SIZE: usize = 64 * 1024;

fn http_version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Builds the metadata prefix: the request line (if requested) followed by
/// headers (if requested, first value only, enumeration order unspecified),
/// followed by a blank-line delimiter when either ran.
fn build_metadata(
    include_request_line: bool,
    include_headers: bool,
    method: &Method,
    path_and_query: &str,
    version: Version,
    headers: &HeaderMap,
) -> Vec<u8> {
    let mut metadata = Vec::new();

    if include_request_line {
        metadata.extend_from_slice(
            format!("{} {} {}\r\n", method, path_and_query, http_version_str(version)).as_bytes(),
        );
    }

    if include_headers {
        for name in headers.keys() {
            let value = headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("");
            metadata.extend_from_slice(format!("{}: {}\r\n", name.as_str(), value).as_bytes());
        }
    }

    if include_request_line || include_headers {
        metadata.extend_from_slice(b"\r\n");
    }

    metadata
}

fn copy_plain_into(buf: &mut WorkerBuffer, body: &[u8]) -> Result<()> {
    for chunk in body.chunks(CHUNK_SIZE) {
        buf.extend(chunk)?;
    }
    Ok(())
}

fn copy_gzip_into(buf: &mut WorkerBuffer, body: &[u8]) -> Result<()> {
    let mut decoder = GzDecoder::new(body);
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = decoder.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend(&chunk[..n])?;
    }
    Ok(())
}

/// `POST /v2/firehose/{persistent}/{tenant}/{namespace}/{topic}`.
pub async fn ingest(
    State(state): State<AppState>,
    Path(vars): Path<RouteVars>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    uri: axum::http::Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let include_request_line = query.get("includeRequestLine").map(String::as_str) == Some("true");
    let include_headers = query.get("includeHeaders").map(String::as_str) == Some("true");
    let async_mode = query.get("mode").map(String::as_str) == Some("async");
    let gzip = headers
        .get(axum::http::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    let metadata = build_metadata(
        include_request_line,
        include_headers,
        &method,
        &uri.to_string(),
        version,
        &headers,
    );

    let payload = state
        .worker_pool()
        .submit(move |buf| -> Result<Vec<u8>> {
            buf.extend(&metadata)?;
            if gzip {
                copy_gzip_into(buf, &body)?;
            } else {
                copy_plain_into(buf, &body)?;
            }
            Ok(buf.as_slice().to_vec())
        })
        .await?;

    let (token, broker_url) = resolve_receiver(&headers, state.config())?;

    let route_vars = HashMap::from([
        ("persistent".to_string(), vars.persistent),
        ("tenant".to_string(), vars.tenant),
        ("namespace".to_string(), vars.namespace),
        ("topic".to_string(), vars.topic),
    ]);
    let addr = topic_from_route(&route_vars, &headers, state.config())?;
    authorize_topic(&addr, &token, state.config())?;

    state
        .producers()
        .produce(&broker_url, &token, &addr.fqn(), payload, async_mode)
        .await?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker_pool::WORKER_BUFFER_SIZE;
    use axum::http::HeaderValue;

    #[test]
    fn metadata_is_empty_when_neither_flag_set() {
        let headers = HeaderMap::new();
        let metadata = build_metadata(false, false, &Method::POST, "/x", Version::HTTP_11, &headers);
        assert!(metadata.is_empty());
    }

    #[test]
    fn metadata_includes_request_line_and_delimiter() {
        let headers = HeaderMap::new();
        let metadata = build_metadata(true, false, &Method::POST, "/v2/firehose/x", Version::HTTP_11, &headers);
        assert_eq!(metadata, b"POST /v2/firehose/x HTTP/1.1\r\n\r\n".to_vec());
    }

    #[test]
    fn metadata_includes_first_header_value_only() {
        let mut headers = HeaderMap::new();
        headers.insert("x-test", HeaderValue::from_static("a"));
        let metadata = build_metadata(false, true, &Method::GET, "/", Version::HTTP_11, &headers);
        assert_eq!(metadata, b"x-test: a\r\n\r\n".to_vec());
    }

    #[test]
    fn plain_copy_preserves_bytes() {
        let mut buf = WorkerBuffer::new();
        copy_plain_into(&mut buf, b"hello").unwrap();
        assert_eq!(buf.as_slice(), b"hello");
    }

    #[test]
    fn gzip_copy_decodes_to_original_bytes() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello world").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut buf = WorkerBuffer::new();
        copy_gzip_into(&mut buf, &compressed).unwrap();
        assert_eq!(buf.as_slice(), b"hello world");
    }

    #[test]
    fn plain_copy_over_capacity_overflows() {
        let mut buf = WorkerBuffer::new();
        let oversized = vec![0u8; WORKER_BUFFER_SIZE];
        assert!(copy_plain_into(&mut buf, &oversized).is_err());
    }
}
