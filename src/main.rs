use http::{HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tryon_relay::{
    application::{
        connection::manager::{ConnectionManager, RetryPolicy},
        dispatch_tryon::use_case::DispatchTryOnUseCase,
    },
    config::Config,
    domain::tryon::endpoint::ServiceRegistry,
    infrastructure::{
        adapters::{AdapterSet, IdmVtonParams},
        gradio::session::GradioConnector,
        imaging::{exchange::ImageExchange, placeholder::ErrorRenderer},
    },
    presentation::http::{routes::create_router, state::AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new("info,tryon_relay=debug,tower_http=debug")
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    tokio::fs::create_dir_all(&config.temp_dir).await?;

    let connector = Arc::new(GradioConnector::new(
        config.request_timeout(),
        config.huggingface_token.clone(),
    )?);
    let registry = ServiceRegistry::from_identifiers(&config.tryon_spaces);
    tracing::info!(endpoints = registry.len(), "Loaded try-on service registry");

    let connections = Arc::new(ConnectionManager::new(
        registry,
        connector,
        RetryPolicy {
            attempts_per_endpoint: config.connect_attempts,
            delay: config.connect_retry_delay(),
        },
    ));

    if !connections.connect().await {
        // Requests retry the connection, so the relay still starts.
        tracing::warn!("No try-on service reachable at startup");
    }

    let adapters = AdapterSet::new(IdmVtonParams {
        garment_description: config.garment_description.clone(),
        denoise_steps: config.denoise_steps,
        seed: config.seed,
        ..IdmVtonParams::default()
    });
    let dispatcher = Arc::new(DispatchTryOnUseCase::new(
        connections.clone(),
        ImageExchange::new(config.temp_dir.clone()),
        adapters,
    ));

    let state = AppState {
        config: config.clone(),
        connections,
        dispatcher,
        renderer: Arc::new(ErrorRenderer::default()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::HeaderName::from_static("x-tryon-status"),
            header::HeaderName::from_static("x-tryon-error"),
            header::HeaderName::from_static("x-tryon-endpoint"),
        ])
        .max_age(Duration::from_secs(3600));

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Try-on relay listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, initiating graceful shutdown");
        }
    }
}
