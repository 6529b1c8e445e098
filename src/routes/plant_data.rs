use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use super::{fail, json_body, ApiError, AppState};
use crate::{PlantStore, RawReading, Reading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/plant-data", get(latest).post(ingest))
}

/// `GET /api/plant-data`: the most recent reading.
async fn latest(State(state): State<AppState>) -> Result<Json<Reading>, ApiError> {
    // ---
    debug!("GET /api/plant-data");
    let reading = state
        .store
        .latest_reading()
        .await
        .map_err(fail("Internal Server Error"))?;
    Ok(Json(reading))
}

/// `POST /api/plant-data`: store a reading uploaded by the sensor collector.
async fn ingest(
    State(state): State<AppState>,
    body: Result<Json<RawReading>, JsonRejection>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    // ---
    const FAILED: &str = "Failed to store plant data";
    let reading = json_body(FAILED, body)?.into_reading();
    state
        .store
        .insert_reading(&reading)
        .await
        .map_err(fail(FAILED))?;

    info!(reading_id = %reading.id, location = %reading.environmental_data.location, "Stored plant reading");
    Ok((StatusCode::CREATED, Json(reading)))
}
