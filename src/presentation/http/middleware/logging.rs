use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    tracing::info!("Request: {} {}", method, uri);

    let started = Instant::now();
    let response = next.run(request).await;

    // Try-on responses are always 200; the outcome travels in a header.
    let outcome = response
        .headers()
        .get("x-tryon-status")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info!(
        status = response.status().as_u16(),
        outcome,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Response: {} {}",
        method,
        uri
    );
    response
}
