//! Health check handler
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub linker_endpoint: String,
    pub uptime_seconds: u64,
    pub total_requests: u64,
}

/// Liveness probe; does not contact the linker
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        linker_endpoint: state.config.linker.endpoint.clone(),
        uptime_seconds: state.uptime_secs(),
        total_requests: state.get_request_count(),
    })
}
