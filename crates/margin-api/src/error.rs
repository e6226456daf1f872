use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use margin_hierarchy::HierarchyError;
use margin_review::ReviewError;
use margin_sync::SyncError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("hierarchy extraction failed: {0}")]
    Hierarchy(#[from] HierarchyError),
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("review failed: {0}")]
    Review(#[from] ReviewError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Hierarchy(_) | ApiError::Sync(_) | ApiError::Review(_) => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = axum::Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
