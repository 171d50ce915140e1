use super::dto::TryOnRequest;
use crate::{
    application::connection::manager::ConnectionManager,
    domain::tryon::{
        endpoint::Endpoint, entity::TryOnOutcome, errors::TryOnError, session::InferenceSession,
    },
    infrastructure::{adapters::AdapterSet, imaging::exchange::ImageExchange},
};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Runs try-on requests against the active service, falling back to the
/// next registered service when the current one is rate limited.
///
/// Fallback is a bounded loop: each round uses one endpoint, and there are
/// never more rounds than registered endpoints. Only rate-limit failures
/// move on; every other failure ends the request.
pub struct DispatchTryOnUseCase {
    connections: Arc<ConnectionManager>,
    exchange: ImageExchange,
    adapters: AdapterSet,
}

impl DispatchTryOnUseCase {
    pub fn new(
        connections: Arc<ConnectionManager>,
        exchange: ImageExchange,
        adapters: AdapterSet,
    ) -> Self {
        Self {
            connections,
            exchange,
            adapters,
        }
    }

    /// Never fails: errors are returned as [`TryOnOutcome::Failure`].
    #[instrument(skip_all, fields(
        subject = %format!("{}x{}", request.subject.width(), request.subject.height()),
        garment = %format!("{}x{}", request.garment.width(), request.garment.height()),
    ))]
    pub async fn dispatch(&self, request: TryOnRequest) -> TryOnOutcome {
        info!("New try-on request received");
        match self.run(&request).await {
            Ok((image, endpoint)) => {
                info!(endpoint = %endpoint, width = image.width(), height = image.height(), "Try-on complete");
                TryOnOutcome::Success { image, endpoint }
            }
            Err(err) => {
                error!(error = %err, "Try-on request failed");
                TryOnOutcome::Failure(err)
            }
        }
    }

    async fn run(&self, request: &TryOnRequest) -> Result<(DynamicImage, Endpoint), TryOnError> {
        request.validate()?;

        let mut session = self
            .connections
            .ensure_session()
            .await
            .ok_or(TryOnError::ServiceUnavailable)?;
        let max_rounds = self.connections.registry().len().max(1);

        for round in 1..=max_rounds {
            let endpoint = session.endpoint().clone();
            info!(endpoint = %endpoint, round, "Using service");

            match self.attempt(session.as_ref(), request).await {
                Ok(image) => return Ok((image, endpoint)),
                Err(err) if err.is_rate_limited() => {
                    warn!(endpoint = %endpoint, error = %err, "Rate limit hit, trying alternative service");
                    if round == max_rounds {
                        // Later requests start over from the top.
                        self.connections.invalidate(&endpoint).await;
                        break;
                    }
                    match self.connections.advance_from(&endpoint).await {
                        Some(next) => {
                            info!(from = %endpoint, to = %next.endpoint(), "Switched service, retrying");
                            session = next;
                        }
                        None => break,
                    }
                }
                Err(err) => {
                    warn!(endpoint = %endpoint, error = %err, "Service call failed");
                    // The request fails, but the next one reconnects.
                    if matches!(err, TryOnError::Remote(_)) {
                        self.connections.invalidate(&endpoint).await;
                    }
                    return Err(err);
                }
            }
        }

        Err(TryOnError::AllRateLimited)
    }

    async fn attempt(
        &self,
        session: &dyn InferenceSession,
        request: &TryOnRequest,
    ) -> Result<DynamicImage, TryOnError> {
        let adapter = self.adapters.for_kind(session.endpoint().kind());
        let encoding = adapter.encoding();

        // Staged files are removed when these guards drop, on every path.
        let subject = self.exchange.persist(&request.subject, "body", encoding)?;
        let garment = self.exchange.persist(&request.garment, "garment", encoding)?;

        let subject_ref = session.upload(subject.path()).await?;
        let garment_ref = session.upload(garment.path()).await?;

        info!(api_name = adapter.api_name(), "Calling try-on service");
        let output = session
            .predict(
                adapter.api_name(),
                adapter.encode_request(&subject_ref, &garment_ref),
            )
            .await?;

        let selected = adapter.decode_response(output)?;
        let local = session.fetch(selected).await?;
        self.exchange.load(local)
    }
}
