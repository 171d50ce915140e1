use super::client::{GradioClient, parse_output};
use crate::domain::tryon::{
    endpoint::Endpoint,
    entity::{FileRef, RemoteOutput},
    errors::TryOnError,
    session::{InferenceSession, SessionConnector},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{path::Path, sync::Arc, time::Duration};
use tracing::info;

pub struct GradioSession {
    endpoint: Endpoint,
    client: GradioClient,
}

impl GradioSession {
    pub fn new(endpoint: Endpoint, client: GradioClient) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl InferenceSession for GradioSession {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn upload(&self, path: &Path) -> Result<FileRef, TryOnError> {
        self.client.upload_file(path).await
    }

    async fn predict(&self, api_name: &str, data: Vec<Value>) -> Result<RemoteOutput, TryOnError> {
        let value = self.client.call(api_name, data).await?;
        parse_output(value)
    }

    async fn fetch(&self, output: RemoteOutput) -> Result<RemoteOutput, TryOnError> {
        match output {
            RemoteOutput::Path(location) => {
                self.client.download(&location).await.map(RemoteOutput::Inline)
            }
            other => Ok(other),
        }
    }
}

/// Opens [`GradioSession`]s over a shared HTTP client.
pub struct GradioConnector {
    http: reqwest::Client,
    token: Option<String>,
}

impl GradioConnector {
    pub fn new(request_timeout: Duration, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("tryon-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, token })
    }
}

#[async_trait]
impl SessionConnector for GradioConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Arc<dyn InferenceSession>, TryOnError> {
        let client =
            GradioClient::connect(self.http.clone(), endpoint.id(), self.token.clone()).await?;
        info!(endpoint = %endpoint, base_url = %client.base_url(), "Opened Gradio session");
        Ok(Arc::new(GradioSession::new(endpoint.clone(), client)))
    }
}
