//! Per-service request and response shapes.
//!
//! Every remote try-on service has its own call signature. An adapter
//! encodes the uploaded input files into that signature and picks the
//! result image out of whatever the service sends back, so the dispatcher
//! never has to know which service it is talking to.

pub mod generic;
pub mod idm_vton;
pub mod nymbo;

use crate::{
    domain::tryon::{
        endpoint::EndpointKind,
        entity::{FileRef, RemoteOutput},
        errors::TryOnError,
    },
    infrastructure::imaging::exchange::ImageEncoding,
};
use serde_json::{Value, json};

pub use generic::GenericAdapter;
pub use idm_vton::{IdmVtonAdapter, IdmVtonParams};
pub use nymbo::NymboAdapter;

pub trait EndpointAdapter: Send + Sync {
    fn kind(&self) -> EndpointKind;

    fn api_name(&self) -> &'static str;

    /// Encoding the service expects for staged input images.
    fn encoding(&self) -> ImageEncoding;

    fn encode_request(&self, subject: &FileRef, garment: &FileRef) -> Vec<Value>;

    /// Reduce the raw output to the single value holding the result image.
    fn decode_response(&self, output: RemoteOutput) -> Result<RemoteOutput, TryOnError>;
}

/// Gradio `FileData` reference to an uploaded file.
pub fn file_data(file: &FileRef) -> Value {
    let mut value = json!({
        "path": file.path,
        "meta": { "_type": "gradio.FileData" },
    });
    if let Some(name) = &file.orig_name {
        value["orig_name"] = Value::String(name.clone());
    }
    value
}

/// One adapter per endpoint kind.
pub struct AdapterSet {
    idm_vton: IdmVtonAdapter,
    nymbo: NymboAdapter,
    generic: GenericAdapter,
}

impl AdapterSet {
    pub fn new(params: IdmVtonParams) -> Self {
        Self {
            idm_vton: IdmVtonAdapter::new(params),
            nymbo: NymboAdapter,
            generic: GenericAdapter,
        }
    }

    pub fn for_kind(&self, kind: EndpointKind) -> &dyn EndpointAdapter {
        match kind {
            EndpointKind::IdmVton => &self.idm_vton,
            EndpointKind::Nymbo => &self.nymbo,
            EndpointKind::Generic => &self.generic,
        }
    }
}

impl Default for AdapterSet {
    fn default() -> Self {
        Self::new(IdmVtonParams::default())
    }
}
