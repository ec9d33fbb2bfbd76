//! Object-storage media proxy
//!
//! Streams audio and image objects from the bucket back to the browser.
//! Keys arrive in whatever shape the old site stored them - absolute
//! URLs, legacy route prefixes, leading slashes - and are normalized
//! before the lookup.
//!
//! Error bodies are flat `{ "error": string }` JSON:
//! - missing key -> 400
//! - object not found -> 404
//! - anything else -> 500

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::AppState;
use crate::storage::{content_type_for_key, normalize_key, StorageError};

/// Query parameters for the media proxy
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub key: Option<String>,
}

/// GET /api/v1/media?key= - Stream an object from the bucket
pub async fn serve_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Response {
    let raw_key = match query.key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => return error_response(StatusCode::BAD_REQUEST, "File key is missing"),
    };

    let key = normalize_key(raw_key);
    if key.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "File key is missing");
    }

    let meta = match state.store.head(&key).await {
        Ok(meta) => meta,
        Err(e) => return storage_error_response(e, &key),
    };

    let stream = match state.store.get_stream(&key).await {
        Ok(stream) => stream,
        Err(e) => return storage_error_response(e, &key),
    };

    let content_type = meta
        .content_type
        .unwrap_or_else(|| content_type_for_key(&key).to_string());

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CACHE_CONTROL,
            "public, max-age=31536000, immutable",
        )
        // Byte-range handling is delegated to the storage client; the
        // header lets players seek by re-requesting
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    if meta.size > 0 {
        builder = builder.header(header::CONTENT_LENGTH, meta.size);
    }

    match builder.body(Body::from_stream(stream)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build media response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

fn storage_error_response(error: StorageError, key: &str) -> Response {
    match error {
        StorageError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "File not found"),
        StorageError::InvalidKey(_) => error_response(StatusCode::BAD_REQUEST, "Invalid file key"),
        other => {
            tracing::error!(key = %key, "Media fetch failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch file")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
