use super::{
    endpoint::Endpoint,
    entity::{FileRef, RemoteOutput},
    errors::TryOnError,
};
use async_trait::async_trait;
use serde_json::Value;
use std::{path::Path, sync::Arc};

/// A live connection to one remote try-on service.
#[async_trait]
pub trait InferenceSession: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Upload a local file so it can be referenced in a prediction.
    async fn upload(&self, path: &Path) -> Result<FileRef, TryOnError>;

    /// Run a named prediction with positional `data`.
    async fn predict(&self, api_name: &str, data: Vec<Value>) -> Result<RemoteOutput, TryOnError>;

    /// Bring a selected output to this machine. Paths reported by the
    /// service are assumed local unless the session knows better.
    async fn fetch(&self, output: RemoteOutput) -> Result<RemoteOutput, TryOnError> {
        Ok(output)
    }
}

/// Opens sessions against endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Arc<dyn InferenceSession>, TryOnError>;
}
