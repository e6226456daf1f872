use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use margin_sync::{QueryOptions, QueryResponse};

use crate::error::ApiError;
use crate::routes::{parse_options, require_string};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/analyze/query", post(query))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct QueryRequestOptions {
    limit: Option<usize>,
    max_chunk_size: Option<usize>,
    overlap: Option<usize>,
}

async fn query(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<QueryResponse>, ApiError> {
    let text = require_string(&body, "text")?;
    let question = require_string(&body, "question")?;
    let request_opts: QueryRequestOptions = parse_options(&body, "options")?;

    let mut opts = QueryOptions::default();
    if let Some(limit) = request_opts.limit {
        opts.limit = limit;
    }
    if let Some(max_chunk_size) = request_opts.max_chunk_size {
        opts.sync.chunk.max_chunk_size = max_chunk_size;
    }
    if let Some(overlap) = request_opts.overlap {
        opts.sync.chunk.overlap = overlap;
    }

    let response = state.sync.query_with_sync(&text, &question, &opts).await?;
    Ok(Json(response))
}
