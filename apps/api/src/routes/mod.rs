pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Applies to the whole multipart request, envelope included.
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/roles", get(handlers::handle_list_roles))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(max_upload))
                .layer(RequestBodyLimitLayer::new(max_upload)),
        )
        .with_state(state)
}
