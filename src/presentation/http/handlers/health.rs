use crate::presentation::http::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    active_endpoint: Option<String>,
    endpoints: Vec<String>,
    version: &'static str,
}

/// Reports whether a try-on session is open. Does not reconnect.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_endpoint = state
        .connections
        .active_endpoint()
        .await
        .map(|endpoint| endpoint.id().to_string());

    let status = if active_endpoint.is_some() {
        "healthy"
    } else {
        tracing::warn!("Health check: no try-on service connected");
        "unhealthy"
    };

    let response = HealthResponse {
        status,
        active_endpoint,
        endpoints: state
            .connections
            .registry()
            .endpoints()
            .iter()
            .map(|endpoint| endpoint.id().to_string())
            .collect(),
        version: env!("CARGO_PKG_VERSION"),
    };

    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(response))
}
