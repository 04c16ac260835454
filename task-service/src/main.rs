use service_core::error::AppError;
use service_core::middleware::spawn_rate_limiter_pruning;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::time::Duration;
use task_service::{build_router, config::TaskConfig, services::Database, AppState};
use tokio::signal;
use tracing::Instrument;

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = TaskConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    task_service::services::metrics::init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting task service"
    );

    let database = Database::connect(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(e.into()))?;

    // Hashes the resolver's dummy credential, so a broken RNG stops startup here
    let state = AppState::new(config.clone(), database)?;
    spawn_rate_limiter_pruning(state.rate_limiters(), RATE_LIMIT_PRUNE_INTERVAL);
    tracing::info!(
        login_attempts = config.rate_limit.login_attempts,
        global_ip_limit = config.rate_limit.global_ip_limit,
        trust_forwarded_for = config.rate_limit.trust_forwarded_for,
        "Rate limiters initialized"
    );

    let app = build_router(state);

    let addr = config.common.socket_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );

    async move {
        tracing::info!(address = %addr, "Listening");

        let listener = tokio::net::TcpListener::bind(addr).await?;

        service_core::axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok::<(), AppError>(())
    }
    .instrument(service_span)
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
