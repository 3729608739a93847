//! Drug-likeness prediction for one SMILES string.

use std::sync::Arc;

use axum::{extract::State, Json};
use druglens_chem::Sanitize;
use druglens_common::PredictionResult;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub smiles: String,
}

/// POST /predict
///
/// The string only has to be syntactically valid here; the 2D image is
/// best effort and comes back as `null` when the structure cannot be
/// sanitized.
pub async fn predict(
    State(state): State<SharedState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    let smiles = request.smiles.trim().to_string();

    if let Err(e) = state.renderer.parse(&smiles, Sanitize::None) {
        debug!("Rejected {:?}: {}", smiles, e);
        return Err(ApiError::InvalidSmiles);
    }

    let input = state.encoder.encode(&smiles);
    let score = state.score(input).await?;

    let image_2d = {
        let state = Arc::clone(&state);
        let smiles = smiles.clone();
        tokio::task::spawn_blocking(move || state.renderer.render_2d(&smiles)).await?
    };
    if image_2d.is_none() {
        warn!("No 2D depiction for {:?}", smiles);
    }

    let result = PredictionResult::new(smiles, score, state.threshold, image_2d);
    debug!("{} -> {} ({})", result.smiles, result.prediction, result.score);
    Ok(Json(result))
}
