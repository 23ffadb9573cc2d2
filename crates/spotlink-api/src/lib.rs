//! Spotlink API - HTTP annotation service
//!
//! Exposes the annotation pipeline over HTTP: app metadata on `GET /`,
//! annotation of a posted MMIF document on `POST /`.

pub mod error;
pub mod handlers;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::metadata).post(handlers::annotate))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
