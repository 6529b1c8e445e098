// src/routes/health.rs
//! Liveness endpoint for the diary backend.
//!
//! `/health` answers without touching the store or any upstream service, so
//! it only says the process is up and serving HTTP.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Subrouter with `GET /health`, generic over the gateway's state type.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
