use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoservice_api::auth::jwt::JwtIssuer;
use autoservice_api::auth::password::Argon2Hasher;
use autoservice_api::config::{provisioning_from_env, ServerConfig};
use autoservice_api::router::build_app_router;
use autoservice_api::state::AppState;
use autoservice_core::clock::SystemClock;
use autoservice_core::desk::{DeskDeps, ServiceDesk};
use autoservice_core::ports::StoreFactory;
use autoservice_core::provisioning::{provision_admin, Provisioned};
use autoservice_db::PgStores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoservice_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let provisioning = provisioning_from_env().context("Invalid admin configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = autoservice_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    autoservice_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    autoservice_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Operator account ---
    let stores = Arc::new(PgStores::new(pool.clone()));
    let passwords = Arc::new(Argon2Hasher);
    match provision_admin(&provisioning, stores.users().as_ref(), passwords.as_ref())
        .await
        .context("Failed to provision admin account")?
    {
        Provisioned::Created => tracing::info!("Admin account created"),
        Provisioned::AlreadyPresent => tracing::info!("Admin account already present"),
    }

    // --- App state ---
    let desk = ServiceDesk::new(DeskDeps {
        stores,
        passwords,
        tokens: Arc::new(JwtIssuer::new(config.jwt.clone())),
        clock: Arc::new(SystemClock),
    });
    let shutdown = CancellationToken::new();
    let state = AppState {
        pool: pool.clone(),
        desk: Arc::new(desk),
        config: Arc::new(config.clone()),
        shutdown: shutdown.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // In-flight requests that have not reached commit give up.
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
