use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
    response::Response, Json, Router,
};
use serde::Serialize;

use crate::{DiaryError, DiaryService, FeedPublisher, PlantStore};

mod diary;
mod health;
mod plant_data;
mod publish;

// ---

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlantStore>,
    pub diary: DiaryService,
    pub publisher: Arc<dyn FeedPublisher>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(plant_data::router())
        .merge(diary::router())
        .merge(publish::router())
        .merge(health::router())
        .with_state(state)
}

/// Error response: a generic per-endpoint message plus the underlying detail.
#[derive(Debug)]
pub struct ApiError {
    message: &'static str,
    source: DiaryError,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    details: String,
}

impl ApiError {
    // ---
    pub fn new(message: &'static str, source: DiaryError) -> Self {
        Self { message, source }
    }

    fn status(&self) -> StatusCode {
        match self.source {
            DiaryError::NotFound(_) => StatusCode::NOT_FOUND,
            DiaryError::InvalidRequest(_) | DiaryError::LengthExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            DiaryError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            DiaryError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DiaryError::ConfigurationMissing(_) | DiaryError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.source, "{}", self.message);
        } else {
            tracing::debug!(status = %status, error = %self.source, "{}", self.message);
        }

        // Not-found keeps the store's own wording ("No data found")
        let error = match &self.source {
            DiaryError::NotFound(what) => what.to_string(),
            _ => self.message.to_string(),
        };

        let body = ErrorBody {
            success: false,
            error,
            details: self.source.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Attach the endpoint's generic failure message to a workflow error.
pub(crate) fn fail(message: &'static str) -> impl Fn(DiaryError) -> ApiError {
    move |source| ApiError::new(message, source)
}

/// Unwrap a JSON request body, turning a rejected body into the error envelope.
pub(crate) fn json_body<T>(
    message: &'static str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    // ---
    body.map(|Json(value)| value).map_err(|rejection| {
        ApiError::new(message, DiaryError::InvalidRequest(rejection.body_text()))
    })
}
