use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    collections::HashMap,
    io::Cursor,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;
use tryon_relay::{
    application::{
        connection::manager::{ConnectionManager, RetryPolicy},
        dispatch_tryon::use_case::DispatchTryOnUseCase,
    },
    config::Config,
    domain::tryon::{
        endpoint::{Endpoint, ServiceRegistry},
        entity::{FileRef, RemoteOutput},
        errors::TryOnError,
        session::{InferenceSession, SessionConnector},
    },
    infrastructure::{
        adapters::AdapterSet,
        imaging::{exchange::ImageExchange, placeholder::ErrorRenderer},
    },
    presentation::http::{routes::create_router, state::AppState},
};
use uuid::Uuid;

pub const RESULT_WIDTH: u32 = 48;
pub const RESULT_HEIGHT: u32 = 64;

/// How a fake remote service answers predictions.
#[derive(Clone)]
pub enum Behavior {
    /// Returns a `RESULT_WIDTH`x`RESULT_HEIGHT` image wrapped in a tuple.
    Succeed,
    RateLimit,
    Fail(String),
}

pub struct FakeSession {
    endpoint: Endpoint,
    behavior: Behavior,
}

#[async_trait]
impl InferenceSession for FakeSession {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn upload(&self, path: &Path) -> Result<FileRef, TryOnError> {
        Ok(FileRef::new(format!("/remote/{}", path.display())))
    }

    async fn predict(&self, _api_name: &str, _data: Vec<Value>) -> Result<RemoteOutput, TryOnError> {
        match &self.behavior {
            Behavior::Succeed => Ok(RemoteOutput::Tuple(vec![
                RemoteOutput::Inline(png_bytes(RESULT_WIDTH, RESULT_HEIGHT).into()),
                RemoteOutput::Path("/remote/mask.png".into()),
            ])),
            Behavior::RateLimit => Err(TryOnError::remote(
                "You have exceeded your GPU quota (90s left)",
            )),
            Behavior::Fail(message) => Err(TryOnError::Remote(message.clone())),
        }
    }
}

/// Endpoints missing from `behaviors` refuse connections.
pub struct FakeConnector {
    behaviors: HashMap<String, Behavior>,
    opened: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Arc<dyn InferenceSession>, TryOnError> {
        self.opened.lock().unwrap().push(endpoint.id().to_string());
        match self.behaviors.get(endpoint.id()) {
            Some(behavior) => Ok(Arc::new(FakeSession {
                endpoint: endpoint.clone(),
                behavior: behavior.clone(),
            })),
            None => Err(TryOnError::Remote("connection refused".into())),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub connector: Arc<FakeConnector>,
    pub state: AppState,
}

fn build_config(spaces: &[&str], temp_dir: PathBuf) -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        tryon_spaces: spaces.iter().map(|s| s.to_string()).collect(),
        huggingface_token: None,
        connect_attempts: 1,
        connect_retry_delay_seconds: 0,
        request_timeout_seconds: 5,
        temp_dir,
        max_upload_bytes: 2 * 1024 * 1024,
        garment_description: "a clothing item".into(),
        denoise_steps: 30,
        seed: 42,
    }
}

/// Build the full router over fake services. `spaces` fixes the fallback
/// order; each listed space answers per its behavior, others are unreachable.
pub async fn spawn_app(spaces: &[(&str, Option<Behavior>)]) -> TestApp {
    let temp_dir = std::env::temp_dir().join(format!("tryon-it-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&temp_dir).expect("failed to create temp dir");

    let ids: Vec<&str> = spaces.iter().map(|(id, _)| *id).collect();
    let config = build_config(&ids, temp_dir.clone());

    let connector = Arc::new(FakeConnector {
        behaviors: spaces
            .iter()
            .filter_map(|(id, behavior)| behavior.clone().map(|b| (id.to_string(), b)))
            .collect(),
        opened: Mutex::new(Vec::new()),
    });

    let connections = Arc::new(ConnectionManager::new(
        ServiceRegistry::from_identifiers(ids.iter().copied()),
        connector.clone(),
        RetryPolicy {
            attempts_per_endpoint: 1,
            delay: Duration::ZERO,
        },
    ));
    connections.connect().await;

    let dispatcher = Arc::new(DispatchTryOnUseCase::new(
        connections.clone(),
        ImageExchange::new(temp_dir),
        AdapterSet::default(),
    ));

    let state = AppState {
        config,
        connections,
        dispatcher,
        renderer: Arc::new(ErrorRenderer::default()),
    };

    TestApp {
        router: create_router(state.clone()),
        connector,
        state,
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.expect("request failed")
}

pub async fn read_json<T: DeserializeOwned>(res: axum::response::Response) -> T {
    let bytes = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not valid json")
}

pub async fn read_image(res: axum::response::Response) -> DynamicImage {
    let bytes = to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    image::load_from_memory(&bytes).expect("body is not a decodable image")
}

pub fn header(res: &axum::response::Response, name: &str) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([120, 80, 200]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("failed to encode png");
    out.into_inner()
}

/// Multipart body with one file part per `(field, bytes)` pair.
pub fn multipart_body(parts: &[(&str, Vec<u8>)]) -> (String, Vec<u8>) {
    let boundary = format!("----tryon-boundary-{}", Uuid::now_v7());
    let mut body = Vec::new();

    for (name, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}.png\"\r\n",
                name, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    (boundary, body)
}

pub fn tryon_request(uri: &str, parts: &[(&str, Vec<u8>)]) -> Request<Body> {
    let (boundary, body) = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .expect("failed to build try-on request")
}

pub fn assert_status(status: StatusCode, expected: StatusCode) {
    assert_eq!(status, expected, "expected {}, got {}", expected, status);
}
