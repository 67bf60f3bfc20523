use anyhow::{Context, Result};
use order::{
    config::{myconfig::Config, server_config::ServerConfig},
    handler::AppRouter,
    state::AppState,
};
use shared::{
    config::{ConnectionManager, ConnectionPool},
    utils::{Telemetry, init_logger, shutdown_signal},
};
use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let (server_config, state, telemetry) = setup().await.context("Failed to setup application")?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let handles = run_servers(server_config, state, shutdown_tx.clone());

    shutdown_signal().await;
    info!("🛑 Shutdown signal received, broadcasting to components...");

    if let Err(e) = shutdown_tx.send(()) {
        warn!("Failed to send shutdown signal: {}", e);
    }

    shutdown(telemetry, handles).await;

    Ok(())
}

async fn setup() -> Result<(ServerConfig, Arc<AppState>, Telemetry)> {
    dotenv::dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;
    let server_config = ServerConfig::from_config(&config)?;

    let telemetry = Telemetry::init("order-service", &config.otel_endpoint)
        .context("Failed to initialize telemetry")?;

    init_logger(
        telemetry.logger_provider(),
        "order-service",
        config.is_dev,
        config.enable_file_log,
    );

    let db_pool = ConnectionManager::new_pool(
        &server_config.database_url,
        config.db_min_conn,
        config.db_max_conn,
    )
    .await
    .context("Failed to initialize database pool")?;

    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let state = Arc::new(AppState::new(db_pool, &config).context("Failed to create AppState")?);

    info!("✅ Application setup completed successfully.");
    Ok((server_config, state, telemetry))
}

fn run_servers(
    server_config: ServerConfig,
    state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    let http_addr = server_config.http_addr;

    let http_state = state.clone();
    let http_shutdown = shutdown_tx.clone();

    let http_handle = tokio::spawn(async move {
        loop {
            info!("Attempting to start HTTP server on {http_addr}");

            match AppRouter::serve(http_addr, http_state.clone(), http_shutdown.subscribe()).await {
                Ok(()) => {
                    info!("HTTP server stopped gracefully.");
                    break;
                }
                Err(e) => {
                    error!("HTTP server failed: {e:#}. Restarting in 5s...");
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                }
            }
        }
    });

    let dispatcher = state.di_container.outbox_dispatcher.clone();
    let dispatcher_shutdown = shutdown_tx.subscribe();

    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_shutdown).await;
    });

    vec![http_handle, dispatcher_handle]
}

async fn shutdown(telemetry: Telemetry, handles: Vec<JoinHandle<()>>) {
    info!("🛑 Shutting down all components...");

    let shutdown_timeout = tokio::time::Duration::from_secs(30);
    let join_all = async {
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Component task panicked: {}", e);
            }
        }
    };

    match tokio::time::timeout(shutdown_timeout, join_all).await {
        Ok(()) => info!("✅ All components shutdown gracefully."),
        Err(_) => warn!("⚠️  Shutdown timeout reached, forcing exit."),
    }

    if let Err(e) = telemetry.shutdown().await {
        error!("Failed to shutdown telemetry: {}", e);
    }

    info!("✅ Order service shutdown complete.");
}

async fn run_migrations(pool: &ConnectionPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}
