//! Interactive 3D view of one conformer.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};
use minijinja::context;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::templates::VISUALIZE_TEMPLATE;

#[derive(Debug, Default, Deserialize)]
pub struct VisualizeParams {
    #[serde(default)]
    pub smiles: String,
}

/// GET /visualize_3d?smiles=
pub async fn visualize_3d(
    State(state): State<SharedState>,
    Query(params): Query<VisualizeParams>,
) -> Result<Html<String>, ApiError> {
    let smiles = params.smiles.trim().to_string();
    if smiles.is_empty() {
        return Err(ApiError::MissingInput);
    }

    let mol_block = {
        let state = Arc::clone(&state);
        let smiles = smiles.clone();
        tokio::task::spawn_blocking(move || state.renderer.mol_block_3d(&smiles)).await?
    }
    .ok_or(ApiError::InvalidInput)?;

    let page = state.templates.render(
        VISUALIZE_TEMPLATE,
        context! { smiles => smiles, mol_block => mol_block },
    )?;
    Ok(Html(page))
}
