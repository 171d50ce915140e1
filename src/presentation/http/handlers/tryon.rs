use crate::{
    application::dispatch_tryon::dto::TryOnRequest,
    domain::tryon::entity::TryOnOutcome,
    infrastructure::imaging::exchange::{ImageEncoding, ImageExchange},
    presentation::http::{errors::AppError, state::AppState},
};
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

pub const STATUS_HEADER: HeaderName = HeaderName::from_static("x-tryon-status");
pub const ERROR_HEADER: HeaderName = HeaderName::from_static("x-tryon-error");
pub const ENDPOINT_HEADER: HeaderName = HeaderName::from_static("x-tryon-endpoint");

/// `POST /api/v1/tryon` with multipart parts `subject` and `garment`.
///
/// Always answers with a PNG: the try-on result, or a placeholder card
/// describing why there is none. `x-tryon-status` tells the two apart.
pub async fn try_on(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut subject: Option<Bytes> = None;
    let mut garment: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or("") {
            "subject" | "body_image" => subject = Some(field.bytes().await?),
            "garment" | "clothing_image" => garment = Some(field.bytes().await?),
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let outcome = match TryOnRequest::from_uploads(subject, garment) {
        Ok(request) => state.dispatcher.dispatch(request).await,
        Err(err) => {
            tracing::warn!(error = %err, "Rejected try-on input");
            TryOnOutcome::Failure(err)
        }
    };

    image_response(&state, outcome)
}

fn image_response(state: &AppState, outcome: TryOnOutcome) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let image = match outcome {
        TryOnOutcome::Success { image, endpoint } => {
            headers.insert(STATUS_HEADER, HeaderValue::from_static("success"));
            if let Ok(value) = HeaderValue::from_str(endpoint.id()) {
                headers.insert(ENDPOINT_HEADER, value);
            }
            image
        }
        TryOnOutcome::Failure(err) => {
            let message = err.to_string();
            headers.insert(STATUS_HEADER, HeaderValue::from_static("error"));
            // Non-ASCII messages cannot travel in a header; the image still carries them.
            if let Ok(value) = HeaderValue::from_str(&message) {
                headers.insert(ERROR_HEADER, value);
            }
            state.renderer.render(&message)
        }
    };

    let body = ImageExchange::encode(&image, ImageEncoding::Png)?;
    Ok((headers, body).into_response())
}
