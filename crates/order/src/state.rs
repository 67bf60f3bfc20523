use crate::{
    abstract_trait::http_client::DynProductClient,
    config::myconfig::Config,
    di::{DependenciesInject, DependenciesInjectDeps},
    http_client::ProductHttpClient,
    outbox::DispatcherConfig,
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynKafka,
    config::{ConnectionPool, Kafka},
    utils::{SystemMetrics, run_metrics_collector},
};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub registry: Arc<Mutex<Registry>>,
    pub system_metrics: Arc<SystemMetrics>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("system_metrics", &self.system_metrics)
            .finish()
    }
}

impl AppState {
    pub fn new(pool: ConnectionPool, config: &Config) -> Result<Self> {
        let kafka = Arc::new(
            Kafka::new(&config.kafka_broker, config.kafka_publish_timeout)
                .context("Failed to create Kafka producer")?,
        ) as DynKafka;

        let product_client = Arc::new(
            ProductHttpClient::new(&config.product_service_url, config.availability_timeout)
                .context("Failed to create product service client")?,
        ) as DynProductClient;

        let mut registry = Registry::default();
        let system_metrics = Arc::new(SystemMetrics::new());

        let dispatcher = DispatcherConfig {
            batch_size: config.outbox.batch_size,
            max_attempts: config.outbox.max_attempts,
            base_backoff: config.outbox.base_backoff,
            max_backoff: config.outbox.max_backoff,
            poll_interval: config.outbox.poll_interval,
            lease: config.kafka_publish_timeout * (config.outbox.batch_size.max(1) as u32 + 1),
        };

        let deps = DependenciesInjectDeps {
            pool,
            kafka,
            product_client,
            dispatcher,
        };

        let di_container = DependenciesInject::new(deps, &mut registry);

        system_metrics.register(&mut registry);

        tokio::spawn(run_metrics_collector(system_metrics.clone()));

        Ok(Self {
            di_container,
            registry: Arc::new(Mutex::new(registry)),
            system_metrics,
        })
    }
}
