use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use margin_ml::Agent;
use margin_review::{criticize, suggest_changes, summarize, Criticism, ReviewOptions, Suggestion};

use crate::error::ApiError;
use crate::routes::require_string;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/criticize", post(criticize_handler))
        .route("/analyze/suggest", post(suggest_handler))
        .route("/analyze/summarize", post(summarize_handler))
}

fn review_options(state: &AppState) -> ReviewOptions {
    ReviewOptions {
        model: Some(state.config.review_model.clone()),
    }
}

async fn criticize_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Vec<Criticism>>, ApiError> {
    let text = require_string(&body, "text")?;
    let agent: &dyn Agent = state.ml.as_ref();

    let results = criticize(&text, agent, &review_options(&state)).await;
    Ok(Json(results))
}

async fn suggest_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
    let text = require_string(&body, "text")?;
    let agent: &dyn Agent = state.ml.as_ref();

    let results = suggest_changes(&text, agent, &review_options(&state)).await;
    Ok(Json(results))
}

#[derive(Debug, Serialize)]
struct SummarizeResponse {
    summary: String,
}

async fn summarize_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let text = require_string(&body, "text")?;
    let agent: &dyn Agent = state.ml.as_ref();

    let summary = summarize(&text, agent, &review_options(&state)).await?;
    Ok(Json(SummarizeResponse { summary }))
}
