use anyhow::{Context, Result};
use std::{str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub max_attempts: i32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub kafka_broker: String,
    pub product_service_url: String,
    pub port: u16,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub availability_timeout: Duration,
    pub kafka_publish_timeout: Duration,
    pub outbox: OutboxConfig,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;

        let kafka_broker = std::env::var("KAFKA").context("Missing environment variable: KAFKA")?;

        let product_service_url = std::env::var("PRODUCT_SERVICE_URL")
            .context("Missing environment variable: PRODUCT_SERVICE_URL")?;

        let port = env_or("ORDER_HTTP_PORT", 8050u16)?;
        let db_max_conn = env_or("DB_MAX_CONNECTION", 5u32)?;
        let db_min_conn = env_or("DB_MIN_CONNECTION", 1u32)?;

        let availability_timeout = Duration::from_millis(env_or("AVAILABILITY_TIMEOUT_MS", 3000u64)?);
        let kafka_publish_timeout =
            Duration::from_millis(env_or("KAFKA_PUBLISH_TIMEOUT_MS", 5000u64)?);

        let outbox = OutboxConfig {
            poll_interval: Duration::from_millis(env_or("OUTBOX_POLL_INTERVAL_MS", 500u64)?),
            batch_size: env_or("OUTBOX_BATCH_SIZE", 50i64)?,
            max_attempts: env_or("OUTBOX_MAX_ATTEMPTS", 10i32)?,
            base_backoff: Duration::from_millis(env_or("OUTBOX_BASE_BACKOFF_MS", 500u64)?),
            max_backoff: Duration::from_millis(env_or("OUTBOX_MAX_BACKOFF_MS", 60_000u64)?),
        };

        if outbox.max_attempts < 1 {
            anyhow::bail!("OUTBOX_MAX_ATTEMPTS must be at least 1");
        }

        let otel_endpoint = std::env::var("OTEL_ENDPOINT")
            .unwrap_or_else(|_| "http://otel-collector:4317".to_string());

        let is_dev = std::env::var("DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let enable_file_log = std::env::var("ENABLE_FILE_LOG")
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            kafka_broker,
            product_service_url,
            port,
            db_max_conn,
            db_min_conn,
            availability_timeout,
            kafka_publish_timeout,
            outbox,
            otel_endpoint,
            is_dev,
            enable_file_log,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Unable to parse {key} (got '{raw}')")),
        Err(_) => Ok(default),
    }
}
