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

pub struct NymboAdapter;

impl EndpointAdapter for NymboAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::Nymbo
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
        match output {
            RemoteOutput::Path(_) | RemoteOutput::Inline(_) => Ok(output),
            other => Err(TryOnError::Decode(format!(
                "Virtual-Try-On returned a {} instead of an image path",
                other.describe()
            ))),
        }
    }
}
