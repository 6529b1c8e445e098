use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{fail, json_body, ApiError, AppState};
use crate::publisher::{publish_diary, publish_test_message};
use crate::{DiaryError, PlantStore};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/publish-diary", post(publish))
        .route("/api/test-bluesky", post(test_message))
}

#[derive(Debug, Deserialize)]
struct PublishRequest {
    diary: Option<String>,
}

#[derive(Debug, Serialize)]
struct PublishResponse {
    success: bool,
    message: &'static str,
}

/// `POST /api/publish-diary`: post the given text to the feed.
async fn publish(
    State(state): State<AppState>,
    body: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, ApiError> {
    // ---
    const FAILED: &str = "Failed to publish diary";
    info!("Starting diary publication");

    let req = json_body(FAILED, body)?;

    let diary = req
        .diary
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            ApiError::new(
                FAILED,
                DiaryError::InvalidRequest("No diary text provided".to_string()),
            )
        })?;

    // Nothing is published until at least one reading exists
    state
        .store
        .latest_reading()
        .await
        .map_err(|e| match e {
            DiaryError::NotFound(_) => ApiError::new(FAILED, DiaryError::NotFound("No plant data found")),
            other => ApiError::new(FAILED, other),
        })?;

    publish_diary(state.publisher.as_ref(), &diary)
        .await
        .map_err(fail(FAILED))?;

    Ok(Json(PublishResponse {
        success: true,
        message: "Diary published successfully",
    }))
}

/// `POST /api/test-bluesky`: post a fixed message to check connectivity.
async fn test_message(State(state): State<AppState>) -> Result<Json<PublishResponse>, ApiError> {
    // ---
    publish_test_message(state.publisher.as_ref())
        .await
        .map_err(fail("Failed to publish test message"))?;

    Ok(Json(PublishResponse {
        success: true,
        message: "Test message published successfully",
    }))
}
