//! HTTP API routes for the relay.
//!
//! Every actor endpoint authenticates with the caller's bearer token, which
//! is passed straight through to the platform — the relay stores nothing.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

pub mod actors;

use crate::config::Config;
use crate::platform::PlatformFactory;

#[derive(Clone)]
pub struct ApiState {
    pub platform: Arc<dyn PlatformFactory>,
    pub config: Arc<Config>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/actors", get(actors::list_actors))
        .route("/actors/{id}", get(actors::get_actor))
        .route("/actors/{id}/schema", get(actors::get_schema))
        .route("/actors/{id}/input-template", get(actors::get_input_template))
        .route("/actors/{id}/execute", post(actors::execute_actor))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "relay",
            "version": "0.1.0"
        })),
    )
}
