//! BoxMeOut Oracle Registry Server
//!
//! Hosts a single oracle registry behind an HTTP API, streams its audit
//! records over WebSocket and sweeps expired attestation rounds in the
//! background.

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use oracle_registry::{Ed25519Verifier, SystemClock};
use oracle_registry_server::{app_state::AppState, config::ServerConfig, expiry, routes};
use tokio::time::{sleep, Duration};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXPIRY_SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("failed to load server configuration")?;

    let app_state = AppState::from_config(&config, Box::new(Ed25519Verifier), Box::new(SystemClock))
        .context("failed to initialize oracle registry")?;
    info!(
        admin = %config.admin_public_key,
        required_consensus = config.registry.required_consensus,
        max_oracles = config.registry.max_oracles,
        "oracle registry initialized"
    );

    // Start and supervise the round expiry job.
    let expiry_service = app_state.registry_service.clone();
    let sweep_seconds = config.expiry_sweep_seconds;
    tokio::spawn(async move {
        let mut restart_count: u32 = 0;
        loop {
            match expiry::start_expiry_job(expiry_service.clone(), sweep_seconds).await {
                Ok(_scheduler) => {
                    // Hold the scheduler for the life of the process.
                    std::future::pending::<()>().await;
                }
                Err(e) => error!(error = %e, "failed to start round expiry job"),
            }

            restart_count = restart_count.saturating_add(1);
            let backoff_seconds = (2u64.saturating_pow(restart_count.min(5)))
                .min(EXPIRY_SUPERVISOR_MAX_BACKOFF_SECONDS);
            warn!(restart_count, backoff_seconds, "round expiry job restart backoff");
            sleep(Duration::from_secs(backoff_seconds)).await;
        }
    });

    let app = routes::app(app_state)
        .layer(build_cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
