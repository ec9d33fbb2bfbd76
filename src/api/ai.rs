//! Public AI endpoints
//!
//! The station site exposes a small chat helper and a post TL;DR
//! feature, both proxied to the external LLM endpoint. Both are public
//! and therefore sit behind the per-client sliding-window rate limiter;
//! a limited client gets 429 with a JSON error message.

use axum::{
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{client_key, ApiError, AppState};
use crate::services::ai::ChatMessage;

/// Maximum chat message length accepted from the public site
const MAX_MESSAGE_LEN: usize = 2_000;

/// Maximum number of prior turns a client may replay
const MAX_HISTORY: usize = 20;

/// Request body for the chat endpoint
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Response body for the chat endpoint
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Request body for the TL;DR endpoint
#[derive(Debug, Deserialize)]
pub struct TldrRequest {
    /// Slug of the published post to summarize
    pub slug: String,
}

/// Response body for the TL;DR endpoint
#[derive(Debug, Serialize)]
pub struct TldrResponse {
    pub summary: String,
}

/// POST /api/v1/ai/chat - Public chat helper
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let client = client_key(&headers);
    if !state.chat_limiter.check(&client).await {
        return Err(ApiError::rate_limited(
            "Too many requests, try again in a minute",
        ));
    }

    let message = body.message.trim();
    if message.is_empty() {
        return Err(ApiError::validation_error("Message is required"));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::validation_error("Message is too long"));
    }
    if body.history.len() > MAX_HISTORY {
        return Err(ApiError::validation_error("History is too long"));
    }

    let mut messages = Vec::with_capacity(body.history.len() + 2);
    messages.push(ChatMessage::system(
        "You are the friendly helper on a university radio station's \
         website. Answer questions about the station, its shows, and its \
         music. Keep replies short.",
    ));
    messages.extend(body.history);
    messages.push(ChatMessage::user(message));

    let reply = state.ai_client.chat(&messages).await?;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/v1/ai/tldr - Summarize a published post
pub async fn tldr(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TldrRequest>,
) -> Result<Json<TldrResponse>, ApiError> {
    let client = client_key(&headers);
    if !state.tldr_limiter.check(&client).await {
        return Err(ApiError::rate_limited(
            "Too many requests, try again in a minute",
        ));
    }

    let post = state
        .post_service
        .get_published(&body.slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", body.slug)))?;

    let summary = state.ai_client.summarize(&post.title, &post.content).await?;
    Ok(Json(TldrResponse { summary }))
}
