use super::AppState;
use super::handlers::{handle_chat, handle_health, handle_reset};

use crate::chat::ChatService;
use crate::config::{Config, EvictionKind, GatewayConfig};
use crate::error::RelayError;
use crate::model::{create_backend, sanitize_error_text};
use crate::session::SessionManager;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Bind `host:port` and run the relay until Ctrl-C or SIGTERM.
pub async fn run_gateway(
    host: &str,
    port: u16,
    config: Arc<Config>,
) -> crate::error::Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("bind gateway socket on {host}:{port}"))?;

    run_gateway_with_listener(listener, config).await
}

/// Run the relay from a pre-bound listener.
///
/// Rejects an invalid config or an unknown backend before serving anything.
pub async fn run_gateway_with_listener(
    listener: TcpListener,
    config: Arc<Config>,
) -> crate::error::Result<()> {
    config.validate()?;
    let local_addr = listener
        .local_addr()
        .context("get gateway listener local address")?;

    let backend = create_backend(&config.generation)?;
    if let Err(e) = backend.generator.warmup().await {
        tracing::warn!(
            backend = backend.name(),
            url = %config.generation.base_url,
            error = %sanitize_error_text(&e.to_string()),
            "model backend is not reachable yet; chat requests will fail until it is"
        );
    }

    let sessions = Arc::new(SessionManager::from_config(&config.session));
    let chat = Arc::new(ChatService::new(
        Arc::clone(&sessions),
        backend,
        &config.generation,
    ));

    let shutdown = CancellationToken::new();
    let sweeper = (config.session.eviction == EvictionKind::Ttl).then(|| {
        sessions.spawn_sweeper(
            Duration::from_secs(config.session.sweep_interval_secs),
            shutdown.clone(),
        )
    });

    print_gateway_banner(&local_addr.to_string(), &config, &chat);

    let result = serve(
        listener,
        AppState::new(chat),
        &config.gateway,
        shutdown_signal(),
    )
    .await;

    shutdown.cancel();
    if let Some(handle) = sweeper
        && let Err(e) = handle.await
    {
        tracing::warn!(error = %e, "session sweeper ended abnormally");
    }
    tracing::info!("gateway stopped");
    result.map_err(RelayError::from)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    gateway: &GatewayConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state, gateway);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serve HTTP gateway")
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

fn print_gateway_banner(display_addr: &str, config: &Config, chat: &ChatService) {
    tracing::info!("Chat relay listening on {display_addr}");
    tracing::info!("  POST /api/chat");
    tracing::info!("  POST /api/reset");
    tracing::info!("  GET  /health");
    tracing::info!(
        backend = chat.backend_name(),
        url = %config.generation.base_url,
        max_length = chat.max_length(),
        generation_timeout_secs = config.generation.timeout_secs,
        "model backend"
    );
    tracing::info!(
        eviction = chat.sessions().policy_name(),
        max_sessions = chat.sessions().capacity(),
        "session store"
    );
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if cors_origins.is_empty() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn build_app(state: AppState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/reset", post(handle_reset))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(gateway.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(gateway.request_timeout_secs),
        ))
        .layer(cors_layer(&gateway.cors_origins))
}
