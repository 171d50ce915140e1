use super::{EndpointAdapter, file_data};
use crate::{
    domain::tryon::{
        endpoint::EndpointKind,
        entity::{FileRef, RemoteOutput},
        errors::TryOnError,
    },
    infrastructure::imaging::exchange::ImageEncoding,
};
use serde_json::Value;

/// Fallback for services without a known signature: `/predict(person, garment)`.
pub struct GenericAdapter;

impl EndpointAdapter for GenericAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Generic
    }

    fn api_name(&self) -> &'static str {
        "/predict"
    }

    fn encoding(&self) -> ImageEncoding {
        ImageEncoding::Jpeg { quality: 75 }
    }

    fn encode_request(&self, subject: &FileRef, garment: &FileRef) -> Vec<Value> {
        vec![file_data(subject), file_data(garment)]
    }

    fn decode_response(&self, output: RemoteOutput) -> Result<RemoteOutput, TryOnError> {
        output
            .into_first()
            .ok_or_else(|| TryOnError::Decode("service returned no image".into()))
    }
}
