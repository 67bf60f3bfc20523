use crate::{
    abstract_trait::{
        http_client::DynProductClient,
        order::service::{DynOrderCommandService, DynOrderQueryService},
        outbox::DynOutboxRepository,
    },
    metrics::OrderMetrics,
    outbox::{DispatcherConfig, OutboxDispatcher},
    repository::{
        order::{OrderCommandRepository, OrderQueryRepository},
        outbox::OutboxRepository,
    },
    service::order::{OrderCommandService, OrderCommandServiceDeps, OrderQueryService},
};
use prometheus_client::registry::Registry;
use shared::{abstract_trait::DynKafka, config::ConnectionPool};
use std::{fmt, sync::Arc};
use tokio::sync::Notify;

#[derive(Clone)]
pub struct DependenciesInject {
    pub order_command: DynOrderCommandService,
    pub order_query: DynOrderQueryService,
    pub outbox_dispatcher: Arc<OutboxDispatcher>,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("order_command", &"OrderCommandService")
            .field("order_query", &"OrderQueryService")
            .field("outbox_dispatcher", &"OutboxDispatcher")
            .finish()
    }
}

pub struct DependenciesInjectDeps {
    pub pool: ConnectionPool,
    pub kafka: DynKafka,
    pub product_client: DynProductClient,
    pub dispatcher: DispatcherConfig,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            pool,
            kafka,
            product_client,
            dispatcher,
        } = deps;

        let order_metrics = OrderMetrics::new();
        order_metrics.register(registry);

        let outbox_notify = Arc::new(Notify::new());

        let order_query_repo = Arc::new(OrderQueryRepository::new(pool.clone()));
        let order_command_repo = Arc::new(OrderCommandRepository::new(pool.clone()));
        let outbox_repo: DynOutboxRepository = Arc::new(OutboxRepository::new(pool));

        let order_command_deps = OrderCommandServiceDeps {
            product_client,
            command: order_command_repo,
            query: order_query_repo.clone(),
            outbox_notify: outbox_notify.clone(),
            order_metrics: order_metrics.clone(),
        };

        let order_command: DynOrderCommandService =
            Arc::new(OrderCommandService::new(order_command_deps, registry));

        let order_query: DynOrderQueryService =
            Arc::new(OrderQueryService::new(order_query_repo, registry));

        let outbox_dispatcher = Arc::new(OutboxDispatcher::new(
            outbox_repo,
            kafka,
            outbox_notify,
            order_metrics,
            dispatcher,
        ));

        Self {
            order_command,
            order_query,
            outbox_dispatcher,
        }
    }
}
