//! Launchpad Backend Server
//!
//! Serves the wallet authentication API: challenge issuance, signature
//! verification, and bearer-token session lookup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use launchpad_server::auth::{AuthService, Ed25519Verifier, TokenIssuer};
use launchpad_server::config::Config;
use launchpad_server::db::{self, Database};
use launchpad_server::routes;
use launchpad_server::state::AppState;
use launchpad_server::store::{
    self, ChallengeStore, MemoryChallengeStore, MemoryUserDirectory, PgChallengeStore,
    PgUserDirectory, UserDirectory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        database = %config.database_url_masked(),
        "Starting launchpad server"
    );

    // Token signing keys are supplied out-of-band; the private half never
    // leaves this process.
    let private_pem = std::fs::read(&config.jwt_private_key_path)
        .with_context(|| format!("failed to read {}", config.jwt_private_key_path))?;
    let public_pem = std::fs::read(&config.jwt_public_key_path)
        .with_context(|| format!("failed to read {}", config.jwt_public_key_path))?;

    let token_issuer = Arc::new(
        TokenIssuer::from_rsa_pem(&private_pem, &public_pem, config.access_token_ttl_seconds)
            .context("failed to load JWT signing keys")?,
    );

    let (challenges, users, database): (
        Arc<dyn ChallengeStore>,
        Arc<dyn UserDirectory>,
        Option<Database>,
    ) = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.db_max_connections).await?;
            db::run_migrations(&pool).await?;
            (
                Arc::new(PgChallengeStore::new(
                    pool.clone(),
                    config.challenge_ttl_seconds,
                )),
                Arc::new(PgUserDirectory::new(pool.clone())),
                Some(Database::new(pool)),
            )
        }
        None => {
            if config.environment.is_production() {
                anyhow::bail!("DATABASE_URL is required in production");
            }
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            (
                Arc::new(MemoryChallengeStore::new(config.challenge_ttl_seconds)),
                Arc::new(MemoryUserDirectory::new()),
                None,
            )
        }
    };

    let auth_service = Arc::new(AuthService::new(
        challenges.clone(),
        users.clone(),
        Arc::new(Ed25519Verifier),
    ));

    // Expired challenges are already unusable; the reaper just keeps the
    // store from accumulating them.
    tokio::spawn(store::challenge_reaper(
        challenges.clone(),
        Duration::from_secs(config.challenge_reap_interval_seconds),
    ));

    let state = AppState::new(auth_service, token_issuer, users, database);

    let app = routes::app_router(state).layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed) = config.cors_allowed_origins.as_deref() else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
