//! Landing page with the prediction form.

use axum::{extract::State, response::Html};
use minijinja::context;

use crate::error::ApiError;
use crate::state::SharedState;
use crate::templates::INDEX_TEMPLATE;

/// GET /
pub async fn index(State(state): State<SharedState>) -> Result<Html<String>, ApiError> {
    let page = state.templates.render(
        INDEX_TEMPLATE,
        context! {
            max_length => state.encoder.max_length(),
            threshold => state.threshold,
        },
    )?;
    Ok(Html(page))
}
