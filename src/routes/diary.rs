use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{fail, ApiError, AppState};
use crate::mood::MoodTag;
use crate::DiaryPost;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/generate-diary", get(generate).post(generate))
        .route("/api/plant-diary", get(current))
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    diary: String,
    post_id: Uuid,
    created_at: DateTime<Utc>,
    moods: Vec<MoodTag>,
    persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Read the latest reading, generate an entry, store it.
async fn generate(State(state): State<AppState>) -> Result<Json<GenerateResponse>, ApiError> {
    // ---
    info!("Starting diary generation");
    let generated = state
        .diary
        .generate()
        .await
        .map_err(fail("Failed to generate plant diary"))?;

    let persisted = generated.persisted();
    let post = generated.post;
    info!(post_id = %post.id, persisted, "Diary generated");

    Ok(Json(GenerateResponse {
        diary: post.content,
        post_id: post.id,
        created_at: post.created_at,
        moods: generated.moods,
        persisted,
        details: generated.persist_error,
    }))
}

/// The most recently stored diary entry.
async fn current(State(state): State<AppState>) -> Result<Json<DiaryPost>, ApiError> {
    // ---
    let post = state
        .diary
        .current()
        .await
        .map_err(fail("Failed to fetch plant diary"))?;
    Ok(Json(post))
}
