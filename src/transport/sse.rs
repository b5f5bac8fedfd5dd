// src/transport/sse.rs
// =============================================================================
// Server-sent events binding.
//
// POST /crawl-website   body: {"url": "https://example.com"}
//
//   200 text/event-stream, one `data: <json>\n\n` frame per CrawlEvent
//   400 {"error": "..."} when the body is not JSON or has no url
//   500 {"error": "..."} when the crawler cannot be built
//
// Once streaming has started, failures arrive as an Error event instead of
// a status code. A client that disconnects drops the stream, which drops
// the CrawlSession and cancels the crawl.
// =============================================================================

use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use super::session::CrawlSession;
use crate::config::CrawlConfig;
use crate::crawl::Crawler;

/// Shared state: the settings every request's crawler is built from
#[derive(Debug, Clone)]
pub struct SseState {
    pub config: CrawlConfig,
}

#[derive(Debug, Deserialize)]
struct CrawlRequest {
    url: Option<String>,
}

// Errors returned before the event stream starts
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the axum router for the crawl endpoint.
pub fn router(config: CrawlConfig) -> Router {
    Router::new()
        .route("/crawl-website", post(crawl_handler))
        .layer(CorsLayer::permissive())
        .with_state(SseState { config })
}

async fn crawl_handler(State(state): State<SseState>, body: Bytes) -> Result<Response, ApiError> {
    let request: CrawlRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;

    // One crawler per request: jobs share no connection pool or state
    let crawler = Crawler::new(state.config.clone()).map_err(|e| {
        tracing::error!(error = %e, "could not build crawler");
        ApiError::Internal(e.to_string())
    })?;

    tracing::info!(%url, "streaming crawl");
    let events = CrawlSession::start(crawler, url)
        .into_stream()
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.as_json())));

    Ok(Sse::new(events).into_response())
}
