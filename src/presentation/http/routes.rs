use super::{
    handlers::{health, tryon},
    middleware::{logging::logging_middleware, request_id::request_id_middleware},
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

pub fn create_router(state: AppState) -> Router {
    let tryon_routes = Router::new()
        .route("/api/v1/tryon", post(tryon::try_on))
        // Legacy Gradio front-end path.
        .route("/api/predict", post(tryon::try_on))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(tryon_routes)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
