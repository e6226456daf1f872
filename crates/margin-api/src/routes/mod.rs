pub mod analyze;
pub mod health;
pub mod query;
pub mod review;

use axum::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(analyze::routes())
        .merge(query::routes())
        .merge(review::routes())
        .merge(health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Pull a required non-empty string field out of an untyped JSON body.
///
/// Requests arrive untyped so that a missing or mistyped field maps to
/// a 400 with a field-specific message rather than a generic
/// deserialization rejection.
pub(crate) fn require_string(body: &Value, field: &str) -> Result<String, ApiError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ApiError::BadRequest(format!(
            "{field} must not be empty"
        ))),
        Some(_) => Err(ApiError::BadRequest(format!("{field} must be a string"))),
        None => Err(ApiError::BadRequest(format!(
            "missing required field: {field}"
        ))),
    }
}

/// Deserialize an optional options object, falling back to defaults.
pub(crate) fn parse_options<T: DeserializeOwned + Default>(
    body: &Value,
    field: &str,
) -> Result<T, ApiError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ApiError::BadRequest(format!("invalid {field}: {e}"))),
    }
}
