use anyhow::{Context, Result};
use product::{
    config::{myconfig::Config, server_config::ServerConfig},
    handler::AppRouter,
    kafka::kafka_consumer::KafkaEventConsumer,
    state::AppState,
};
use shared::{
    config::{ConnectionManager, ConnectionPool},
    utils::{Telemetry, init_logger, shutdown_signal},
};
use std::sync::Arc;
use tokio::{sync::broadcast, task::JoinHandle, time::Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, server_config, state, telemetry) =
        setup().await.context("Failed to setup application")?;

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let handles = run_servers(config, server_config, state, shutdown_tx.clone());

    shutdown_signal().await;
    info!("🛑 Shutdown signal received, broadcasting to components...");

    if let Err(e) = shutdown_tx.send(()) {
        warn!("Failed to send shutdown signal: {}", e);
    }

    shutdown(telemetry, handles).await;

    Ok(())
}

async fn setup() -> Result<(Config, ServerConfig, Arc<AppState>, Telemetry)> {
    dotenv::dotenv().ok();

    let config = Config::init().context("Failed to load configuration")?;
    let server_config = ServerConfig::from_config(&config)?;

    let telemetry = Telemetry::init("product-service", &config.otel_endpoint)
        .context("Failed to initialize telemetry")?;

    init_logger(
        telemetry.logger_provider(),
        "product-service",
        config.is_dev,
        config.enable_file_log,
    );

    info!("🚀 Starting Product Service initialization...");

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

    let state = Arc::new(AppState::new(db_pool, &config));

    info!(
        "✅ Application setup completed successfully (stock underflow policy: {})",
        config.underflow_policy
    );
    Ok((config, server_config, state, telemetry))
}

fn run_servers(
    config: Config,
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
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    });

    let handler = state.di_container.event_handler.clone();
    let consumer_shutdown = shutdown_tx.clone();

    let consumer_handle = tokio::spawn(async move {
        let mut stop_rx = consumer_shutdown.subscribe();

        loop {
            let run = match KafkaEventConsumer::new(
                &config.kafka_broker,
                &config.consumer.group_id,
                handler.clone(),
            ) {
                Ok(consumer) => consumer.run(consumer_shutdown.subscribe()).await,
                Err(e) => Err(e),
            };

            match run {
                Ok(()) => {
                    info!("Kafka consumer stopped gracefully.");
                    break;
                }
                Err(e) => {
                    error!("Kafka consumer failed: {e:#}. Restarting in 5s...");
                    tokio::select! {
                        _ = stop_rx.recv() => break,
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                    }
                }
            }
        }
    });

    vec![http_handle, consumer_handle]
}

async fn shutdown(telemetry: Telemetry, handles: Vec<JoinHandle<()>>) {
    info!("🛑 Shutting down all components...");

    let shutdown_timeout = Duration::from_secs(30);
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

    info!("✅ Product service shutdown complete.");
}

async fn run_migrations(pool: &ConnectionPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}
