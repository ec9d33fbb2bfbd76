//! Live audio stream relay
//!
//! Each inbound request opens a fresh connection to the upstream
//! Shoutcast/Icecast mount and pipes the body through unaltered as
//! `audio/mpeg`. There is no fan-out: N concurrent listeners hold N
//! upstream connections. When the listener disconnects, dropping the
//! response body tears the upstream connection down.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::middleware::AppState;

/// GET /api/v1/stream - Relay the live stream
///
/// The upstream URL comes from the active stream config row, falling back
/// to the configured default. Any upstream connection failure maps to 502
/// with the body `"Upstream error"`; no retry, no reconnect.
pub async fn relay(State(state): State<AppState>) -> Response {
    let upstream_url = match state.stream_repo.get_active().await {
        Ok(Some(config)) => config.stream_url,
        Ok(None) => state.relay_config.upstream_url.clone(),
        Err(e) => {
            tracing::warn!("Failed to load stream config, using default: {}", e);
            state.relay_config.upstream_url.clone()
        }
    };

    let upstream = state
        .relay_http
        .get(&upstream_url)
        // Ask the ICY server not to interleave metadata so the body is
        // pure audio frames
        .header("Icy-MetaData", "0")
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::warn!(status = %response.status(), url = %upstream_url, "Upstream rejected relay connection");
            return upstream_error();
        }
        Err(e) => {
            tracing::warn!(url = %upstream_url, "Upstream connection failed: {}", e);
            return upstream_error();
        }
    };

    tracing::debug!(url = %upstream_url, "Relay connected");

    let body = Body::from_stream(upstream.bytes_stream());
    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(header::CACHE_CONTROL, "no-store")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body)
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build relay response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn upstream_error() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream error").into_response()
}
