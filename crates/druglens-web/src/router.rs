//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppContext, SharedState};
use crate::handlers::{
    health::health,
    index::index,
    predict::predict,
    visualize::visualize_3d,
};

/// Build and return the full Axum router.
pub fn build_router(context: AppContext) -> Router {
    let shared: SharedState = Arc::new(context);
    let static_files = ServeDir::new(&shared.static_dir);

    Router::new()
        // Pages
        .route("/",             get(index))
        .route("/visualize_3d", get(visualize_3d))

        // API endpoints
        .route("/predict",      post(predict))
        .route("/health",       get(health))

        // Static files
        .nest_service("/static", static_files)

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
