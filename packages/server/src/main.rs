use std::sync::Arc;

use anyhow::Context;
use common::store::MemoryStore;
use server::config::AppConfig;
use server::database::init_db;
use server::seed;
use server::state::AppState;
use server::store::DbStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use worker::{ExecutionClient, Judge0Backend, PollSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let backend =
        Judge0Backend::new(&config.execution).context("Failed to build execution backend client")?;
    let client = ExecutionClient::new(
        Arc::new(backend),
        config.retry,
        PollSettings::from(&config.execution),
    );
    info!(
        base_url = %config.execution.base_url,
        max_retries = config.retry.max_retries,
        "Execution backend configured"
    );

    let state = match &config.database.url {
        Some(url) => {
            let db = init_db(url)
                .await
                .context("Failed to initialize database")?;
            if config.database.seed_samples {
                seed::seed_problems(&db)
                    .await
                    .context("Failed to seed sample problems")?;
            }
            info!("Database connected");
            AppState::new(Arc::new(DbStore::new(db)), client, config.clone())
        }
        None => {
            warn!("No database configured, data is kept in memory only");
            let store = Arc::new(MemoryStore::new());
            if config.database.seed_samples {
                seed::seed_memory(&store).await;
            }
            AppState::new(store, client, config.clone())
        }
    };

    let pool = state.pool.clone();
    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Waiting for queued evaluations to finish");
    pool.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
