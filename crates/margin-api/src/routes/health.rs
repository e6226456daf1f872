use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let ml_ok = state.ml.health_check().await.unwrap_or(false);
    let store_ok = state.store.count().await.is_ok();

    let status = if ml_ok && store_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "services": {
            "ml": if ml_ok { "ok" } else { "error" },
            "vectorStore": if store_ok { "ok" } else { "error" },
        }
    }))
}
