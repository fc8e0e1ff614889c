// HTTP request handlers
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_renderer::dashboard_to_json;
use crate::presentation::app_state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Every configured chart, as complete as the upstream data allows
pub async fn get_stats(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.stats_service.build_dashboard().await;

    match json_response(&dashboard_to_json(&dashboard), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Progressive variant of `get_stats` for clients that show a loading state
pub async fn stream_stats(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.stats_service.stream_dashboard();
    stream_from_receiver(rx, accepts_brotli(&headers)).await
}
