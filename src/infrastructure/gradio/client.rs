use super::sse;
use crate::domain::tryon::{
    entity::{FileRef, RemoteOutput},
    errors::TryOnError,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct QueuedEvent {
    event_id: String,
}

/// HTTP client for one Gradio app.
#[derive(Debug, Clone)]
pub struct GradioClient {
    http: Client,
    base_url: String,
    api_prefix: String,
    token: Option<String>,
}

/// Map a Space id (`owner/name`) to its host; full URLs pass through.
pub fn base_url_for(identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        identifier.trim_end_matches('/').to_string()
    } else {
        let subdomain = identifier.to_lowercase().replace(['/', '_', '.'], "-");
        format!("https://{}.hf.space", subdomain)
    }
}

impl GradioClient {
    /// Probe `/config` and build a client for the app behind `identifier`.
    #[instrument(skip(http, token))]
    pub async fn connect(
        http: Client,
        identifier: &str,
        token: Option<String>,
    ) -> Result<Self, TryOnError> {
        let mut client = Self {
            http,
            base_url: base_url_for(identifier),
            api_prefix: String::new(),
            token,
        };

        let url = format!("{}/config", client.base_url);
        let response = client
            .authorized(client.http.get(&url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "config").await?;
        let config: Value = response
            .json()
            .await
            .map_err(|e| TryOnError::Remote(format!("Invalid config from {}: {}", url, e)))?;

        // Gradio 5 serves its API under a prefix advertised in the config.
        if let Some(prefix) = config.get("api_prefix").and_then(Value::as_str) {
            client.api_prefix = prefix.trim_end_matches('/').to_string();
        }
        let version = config
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!(
            base_url = %client.base_url,
            api_prefix = %client.api_prefix,
            version,
            "Gradio app reachable"
        );
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    pub fn file_url(&self, remote_path: &str) -> String {
        self.api_url(&format!("/file={}", remote_path))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn upload_file(&self, path: &Path) -> Result<FileRef, TryOnError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime_for(path))
            .map_err(transport_error)?;

        let response = self
            .authorized(self.http.post(self.api_url("/upload")))
            .multipart(Form::new().part("files", part))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "upload").await?;
        let paths: Vec<String> = response
            .json()
            .await
            .map_err(|e| TryOnError::Remote(format!("Invalid upload response: {}", e)))?;

        let remote = paths
            .into_iter()
            .next()
            .ok_or_else(|| TryOnError::Remote("Upload returned no file path".into()))?;
        debug!(local = %path.display(), remote = %remote, "Uploaded input image");
        Ok(FileRef {
            path: remote,
            orig_name: Some(file_name),
        })
    }

    /// Queue a prediction and wait for its result stream to complete.
    #[instrument(skip(self, data), fields(base_url = %self.base_url))]
    pub async fn call(&self, api_name: &str, data: Vec<Value>) -> Result<Value, TryOnError> {
        let route = format!("/call/{}", api_name.trim_start_matches('/'));

        let response = self
            .authorized(self.http.post(self.api_url(&route)))
            .json(&json!({ "data": data }))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "call").await?;
        let queued: QueuedEvent = response
            .json()
            .await
            .map_err(|e| TryOnError::Remote(format!("Invalid queue response: {}", e)))?;
        debug!(event_id = %queued.event_id, "Prediction queued");

        let response = self
            .authorized(
                self.http
                    .get(self.api_url(&format!("{}/{}", route, queued.event_id))),
            )
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "result").await?;
        let body = response.text().await.map_err(transport_error)?;
        sse::completion(&body)
    }

    /// Download a file the app reported, by URL or by server-side path.
    pub async fn download(&self, location: &str) -> Result<Bytes, TryOnError> {
        let url = if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            self.file_url(location)
        };
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "download").await?;
        response.bytes().await.map_err(transport_error)
    }
}

/// Convert a completion payload into the output shape adapters understand.
/// File references stay as [`RemoteOutput::Path`] until downloaded.
pub fn parse_output(value: Value) -> Result<RemoteOutput, TryOnError> {
    match value {
        Value::Null => Ok(RemoteOutput::Empty),
        Value::Array(items) => items
            .into_iter()
            .map(parse_output)
            .collect::<Result<Vec<_>, _>>()
            .map(RemoteOutput::Tuple),
        Value::String(text) if text.starts_with("data:") => {
            decode_data_url(&text).map(RemoteOutput::Inline)
        }
        Value::String(text) => Ok(RemoteOutput::Path(text)),
        Value::Object(map) => {
            let location = ["url", "path"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .ok_or_else(|| TryOnError::Decode("file output has no url or path".into()))?;
            parse_output(Value::String(location.to_string()))
        }
        other => Err(TryOnError::Decode(format!(
            "unexpected output value: {}",
            other
        ))),
    }
}

fn decode_data_url(url: &str) -> Result<Bytes, TryOnError> {
    let (_, payload) = url
        .split_once("base64,")
        .ok_or_else(|| TryOnError::Decode("data URL is not base64 encoded".into()))?;
    STANDARD
        .decode(payload)
        .map(Bytes::from)
        .map_err(|e| TryOnError::Decode(format!("invalid base64 image: {}", e)))
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

async fn check_status(response: Response, step: &str) -> Result<Response, TryOnError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, step, &body))
}

/// Longest upstream detail kept in an error message.
const MAX_DETAIL_CHARS: usize = 160;

fn status_error(status: StatusCode, step: &str, body: &str) -> TryOnError {
    let message = match error_detail(body) {
        Some(detail) => format!("{} failed: {}: {}", step, status, detail),
        None => format!("{} failed: {}", step, status),
    };
    if status == StatusCode::TOO_MANY_REQUESTS {
        TryOnError::RateLimited(message)
    } else {
        TryOnError::remote(message)
    }
}

/// Short, single-line detail from an error body. JSON bodies contribute
/// their `error`/`detail`/`message` field; HTML pages contribute nothing.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() || body.starts_with('<') {
        return None;
    }
    let detail = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => ["error", "detail", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)?,
        Ok(Value::String(text)) => text,
        _ => body.to_string(),
    };
    let detail = detail.split_whitespace().collect::<Vec<_>>().join(" ");
    if detail.chars().count() > MAX_DETAIL_CHARS {
        Some(format!(
            "{}...",
            detail.chars().take(MAX_DETAIL_CHARS).collect::<String>()
        ))
    } else {
        Some(detail)
    }
}

fn transport_error(err: reqwest::Error) -> TryOnError {
    if err.is_timeout() {
        TryOnError::Remote(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        TryOnError::Remote(format!("Connection failed: {}", err))
    } else {
        TryOnError::remote(err.to_string())
    }
}
