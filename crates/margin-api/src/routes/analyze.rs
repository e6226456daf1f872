use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use margin_chunker::{analyze_document, analyze_text, AnalysisResult, ChunkOptions, DocumentStats};
use margin_hierarchy::{extract_hierarchy, HierarchyMap, HierarchyOptions};
use margin_ml::Embedder;

use crate::error::ApiError;
use crate::routes::{parse_options, require_string};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze/chunk", post(chunk))
        .route("/analyze/stats", post(stats))
        .route("/analyze/hierarchy", post(hierarchy))
}

async fn chunk(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let text = require_string(&body, "text")?;
    let opts: ChunkOptions = parse_options(&body, "options")?;
    let use_hierarchy = body
        .get("useHierarchy")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let result = if use_hierarchy {
        let embedder: &dyn Embedder = state.ml.as_ref();
        let map =
            extract_hierarchy(&text, Some(embedder), &HierarchyOptions::default()).await?;
        analyze_document(&text, &opts, Some(&map))
    } else {
        analyze_document(&text, &opts, None)
    };

    Ok(Json(result))
}

async fn stats(Json(body): Json<Value>) -> Result<Json<DocumentStats>, ApiError> {
    let text = require_string(&body, "text")?;
    Ok(Json(analyze_text(&text)))
}

async fn hierarchy(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<HierarchyMap>, ApiError> {
    let text = require_string(&body, "text")?;
    let opts: HierarchyOptions = parse_options(&body, "options")?;

    let embedder: &dyn Embedder = state.ml.as_ref();
    let map = extract_hierarchy(&text, Some(embedder), &opts).await?;

    Ok(Json(map))
}
