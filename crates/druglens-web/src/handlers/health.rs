use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::SharedState;

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model_name,
        "vocab_size": state.encoder.vocab_size(),
        "max_length": state.encoder.max_length(),
        "threshold": state.threshold,
    }))
}
