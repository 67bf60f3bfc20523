use crate::domain::adjustment::UnderflowPolicy;
use anyhow::{Context, Result};
use std::{str::FromStr, time::Duration};

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub group_id: String,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub kafka_broker: String,
    pub port: u16,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub underflow_policy: UnderflowPolicy,
    pub consumer: ConsumerConfig,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;

        let kafka_broker = std::env::var("KAFKA").context("Missing environment variable: KAFKA")?;

        let port = env_or("PRODUCT_HTTP_PORT", 8051u16)?;
        let db_max_conn = env_or("DB_MAX_CONNECTION", 5u32)?;
        let db_min_conn = env_or("DB_MIN_CONNECTION", 1u32)?;

        let underflow_policy = env_or("STOCK_UNDERFLOW_POLICY", UnderflowPolicy::Reject)?;

        let consumer = ConsumerConfig {
            group_id: std::env::var("KAFKA_GROUP_ID")
                .unwrap_or_else(|_| "product-service-group".to_string()),
            max_retries: env_or("CONSUMER_MAX_RETRIES", 3u32)?,
            retry_backoff: Duration::from_millis(env_or("CONSUMER_RETRY_BACKOFF_MS", 1000u64)?),
        };

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
            port,
            db_max_conn,
            db_min_conn,
            underflow_policy,
            consumer,
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
