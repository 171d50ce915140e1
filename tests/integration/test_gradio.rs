use super::helpers::png_bytes;
use axum::{
    Json, Router,
    extract::{Multipart, Path as RoutePath, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tryon_relay::{
    domain::tryon::{
        endpoint::Endpoint, entity::RemoteOutput, errors::TryOnError, session::SessionConnector,
    },
    infrastructure::gradio::session::GradioConnector,
};
use uuid::Uuid;

#[derive(Clone, Default)]
struct Recorded {
    authorization: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct FakeSpace {
    recorded: Recorded,
    prefix: &'static str,
    /// Status answered by `POST /call/{api}`; `None` queues normally.
    call_status: Option<StatusCode>,
    /// Raw SSE body answered by `GET /call/{api}/{event_id}`.
    stream: String,
}

async fn config(State(space): State<FakeSpace>, headers: HeaderMap) -> Json<Value> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        space.recorded.authorization.lock().unwrap().push(auth.to_string());
    }
    if space.prefix.is_empty() {
        Json(json!({ "version": "4.44.0" }))
    } else {
        Json(json!({ "version": "5.9.1", "api_prefix": space.prefix }))
    }
}

async fn upload(State(space): State<FakeSpace>, mut multipart: Multipart) -> Json<Vec<String>> {
    let mut paths = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        assert_eq!(field.name(), Some("files"));
        let name = field.file_name().unwrap_or("blob").to_string();
        let bytes = field.bytes().await.unwrap();
        assert!(!bytes.is_empty());
        let path = format!("/tmp/gradio/{}", name);
        space.recorded.uploads.lock().unwrap().push(path.clone());
        paths.push(path);
    }
    Json(paths)
}

async fn call(
    State(space): State<FakeSpace>,
    RoutePath(api): RoutePath<String>,
    Json(body): Json<Value>,
) -> Response {
    space.recorded.calls.lock().unwrap().push(json!({ "api": api, "body": body }));
    match space.call_status {
        Some(status) => (status, "Too Many Requests").into_response(),
        None => Json(json!({ "event_id": "evt-1" })).into_response(),
    }
}

async fn stream(State(space): State<FakeSpace>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        space.stream.clone(),
    )
        .into_response()
}

async fn files(uri: Uri) -> Response {
    let path = uri.path();
    if path.ends_with("/file=/tmp/gradio/result.png") {
        ([(header::CONTENT_TYPE, "image/png")], png_bytes(12, 16)).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// Serve a fake Gradio app on an ephemeral port; returns its base URL.
async fn spawn_space(space: FakeSpace) -> String {
    let prefix = space.prefix;
    let api = Router::new()
        .route("/upload", post(upload))
        .route("/call/{api}", post(call))
        .route("/call/{api}/{event_id}", get(stream));
    let api = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(prefix, api)
    };
    let app = Router::new()
        .route("/config", get(config))
        .merge(api)
        .fallback(files)
        .with_state(space);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn complete_stream(payload: Value) -> String {
    format!(
        "event: generating\ndata: null\n\nevent: complete\ndata: {}\n\n",
        payload
    )
}

fn staged_file() -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("gradio-it-{}.png", Uuid::now_v7()));
    std::fs::write(&path, png_bytes(8, 8)).unwrap();
    path
}

fn connector(token: Option<&str>) -> GradioConnector {
    GradioConnector::new(Duration::from_secs(5), token.map(str::to_string)).unwrap()
}

#[tokio::test]
async fn full_prediction_round_trip() {
    let recorded = Recorded::default();
    let base = spawn_space(FakeSpace {
        recorded: recorded.clone(),
        prefix: "",
        call_status: None,
        stream: complete_stream(json!([
            { "path": "/tmp/gradio/result.png", "url": null },
            { "path": "/tmp/gradio/mask.png", "url": null }
        ])),
    })
    .await;

    let session = connector(Some("hf_test"))
        .open(&Endpoint::new(base))
        .await
        .expect("connect should succeed");

    let staged = staged_file();
    let file = session.upload(&staged).await.expect("upload should succeed");
    assert!(file.path.starts_with("/tmp/gradio/gradio-it-"));
    assert!(file.orig_name.is_some());

    let output = session
        .predict("/tryon", vec![json!({ "path": file.path }), json!(42)])
        .await
        .expect("predict should succeed");
    let first = output.into_first().expect("tuple has a first element");
    assert_eq!(first, RemoteOutput::Path("/tmp/gradio/result.png".into()));

    let fetched = session.fetch(first).await.expect("download should succeed");
    let RemoteOutput::Inline(bytes) = fetched else {
        panic!("expected downloaded bytes");
    };
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (12, 16));

    assert_eq!(
        recorded.authorization.lock().unwrap().as_slice(),
        ["Bearer hf_test"]
    );
    let calls = recorded.calls.lock().unwrap();
    assert_eq!(calls[0]["api"], "tryon");
    assert_eq!(calls[0]["body"]["data"][1], 42);

    std::fs::remove_file(staged).ok();
}

#[tokio::test]
async fn api_prefix_from_config_is_honoured() {
    let recorded = Recorded::default();
    let base = spawn_space(FakeSpace {
        recorded: recorded.clone(),
        prefix: "/gradio_api",
        call_status: None,
        stream: complete_stream(json!("/tmp/gradio/result.png")),
    })
    .await;

    let session = connector(None).open(&Endpoint::new(base)).await.unwrap();
    let staged = staged_file();
    session.upload(&staged).await.expect("prefixed upload");

    let output = session.predict("/predict", vec![]).await.unwrap();
    let fetched = session.fetch(output).await.expect("prefixed download");
    assert!(matches!(fetched, RemoteOutput::Inline(_)));
    assert!(recorded.authorization.lock().unwrap().is_empty());

    std::fs::remove_file(staged).ok();
}

#[tokio::test]
async fn http_429_is_rate_limited() {
    let base = spawn_space(FakeSpace {
        recorded: Recorded::default(),
        prefix: "",
        call_status: Some(StatusCode::TOO_MANY_REQUESTS),
        stream: String::new(),
    })
    .await;

    let session = connector(None).open(&Endpoint::new(base)).await.unwrap();
    let err = session.predict("/tryon", vec![]).await.unwrap_err();
    assert!(err.is_rate_limited(), "expected rate limit, got {err:?}");
}

#[tokio::test]
async fn quota_error_event_is_rate_limited() {
    let base = spawn_space(FakeSpace {
        recorded: Recorded::default(),
        prefix: "",
        call_status: None,
        stream: "event: error\ndata: \"You have exceeded your GPU quota (120s left)\"\n\n".into(),
    })
    .await;

    let session = connector(None).open(&Endpoint::new(base)).await.unwrap();
    let err = session.predict("/tryon", vec![]).await.unwrap_err();
    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn other_error_event_is_terminal() {
    let base = spawn_space(FakeSpace {
        recorded: Recorded::default(),
        prefix: "",
        call_status: None,
        stream: "event: error\ndata: null\n\n".into(),
    })
    .await;

    let session = connector(None).open(&Endpoint::new(base)).await.unwrap();
    let err = session.predict("/tryon", vec![]).await.unwrap_err();
    assert!(matches!(err, TryOnError::Remote(_)));
}

#[tokio::test]
async fn unreachable_space_fails_to_connect() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = connector(None)
        .open(&Endpoint::new(format!("http://{}", addr)))
        .await;
    assert!(result.is_err());
}
