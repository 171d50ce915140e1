use super::{EndpointAdapter, file_data};
use crate::{
    domain::tryon::{
        endpoint::EndpointKind,
        entity::{FileRef, RemoteOutput},
        errors::TryOnError,
    },
    infrastructure::imaging::exchange::ImageEncoding,
};
use serde_json::{Value, json};

/// Tunables sent with every IDM-VTON request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdmVtonParams {
    pub garment_description: String,
    pub auto_mask: bool,
    pub auto_crop: bool,
    pub denoise_steps: u32,
    pub seed: i64,
}

impl Default for IdmVtonParams {
    fn default() -> Self {
        Self {
            garment_description: "a clothing item".to_string(),
            auto_mask: true,
            auto_crop: false,
            denoise_steps: 30,
            seed: 42,
        }
    }
}

pub struct IdmVtonAdapter {
    params: IdmVtonParams,
}

impl IdmVtonAdapter {
    pub fn new(params: IdmVtonParams) -> Self {
        Self { params }
    }
}

impl EndpointAdapter for IdmVtonAdapter {
    fn kind(&self) -> EndpointKind {
        EndpointKind::IdmVton
    }

    fn api_name(&self) -> &'static str {
        "/tryon"
    }

    fn encoding(&self) -> ImageEncoding {
        ImageEncoding::Jpeg { quality: 95 }
    }

    fn encode_request(&self, subject: &FileRef, garment: &FileRef) -> Vec<Value> {
        // The person image goes in as an image-editor value with no mask layers.
        vec![
            json!({
                "background": file_data(subject),
                "layers": [],
                "composite": null,
            }),
            file_data(garment),
            Value::String(self.params.garment_description.clone()),
            Value::Bool(self.params.auto_mask),
            Value::Bool(self.params.auto_crop),
            json!(self.params.denoise_steps),
            json!(self.params.seed),
        ]
    }

    fn decode_response(&self, output: RemoteOutput) -> Result<RemoteOutput, TryOnError> {
        // (result, masked_input); anything non-tuple is taken as the image itself.
        output
            .into_first()
            .ok_or_else(|| TryOnError::Decode("IDM-VTON returned an empty result".into()))
    }
}
