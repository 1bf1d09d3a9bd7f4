// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP request handlers.
//!
//! The ingest handler is deliberately unconditional: whatever the body
//! looks like, the request is recorded and the caller gets 200. Telemetry
//! delivery problems belong to the write pipeline, never to the response.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rpcflux::point::unix_timestamp_ns;
use rpcflux::recorder::{RequestRecorder, RequestTags};
use std::sync::Arc;

/// Origin URL annotated by the upstream proxy/CDN.
pub const HEADER_ORIGIN_URL: &str = "X-CF-URL";
/// Country code annotated by the upstream proxy/CDN.
pub const HEADER_COUNTRY: &str = "X-CF-COUNTRY";
/// Cache-hit count annotated by the upstream proxy/CDN.
pub const HEADER_CACHE_HITS: &str = "X-CF-CACHEHITS";

/// Shared application state
pub struct AppState {
    pub recorder: RequestRecorder,
}

/// POST / - observe one JSON-RPC request.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let timestamp_ns = unix_timestamp_ns();
    let (tags, cache_hits) = extract_tags(&headers);
    state.recorder.record(&tags, cache_hits, &body, timestamp_ns);

    StatusCode::OK
}

/// GET /health
pub async fn health() -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

/// GET /info - gateway info
pub async fn info() -> Response {
    let info = serde_json::json!({
        "name": "rpcflux-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/", "/health", "/info"],
    });

    (StatusCode::OK, Json(info)).into_response()
}

/// Derive the request tag set and the optional cache-hit count.
///
/// Missing headers become empty tag values. The cache-hit header only
/// counts when it parses as a non-negative integer; anything else is
/// treated as no data, not as an error.
pub fn extract_tags(headers: &HeaderMap) -> (RequestTags, Option<i64>) {
    let tags = RequestTags {
        origin_url: header_value(headers, HEADER_ORIGIN_URL),
        country: header_value(headers, HEADER_COUNTRY),
    };

    let cache_hits = headers
        .get(HEADER_CACHE_HITS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|n| *n >= 0);

    (tags, cache_hits)
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
