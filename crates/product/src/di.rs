use crate::{
    abstract_trait::product::service::{DynInventoryAdjuster, DynProductQueryService},
    domain::adjustment::UnderflowPolicy,
    kafka::event::{OrderEventHandler, RetryPolicy},
    metrics::InventoryMetrics,
    repository::{ProductCommandRepository, ProductQueryRepository},
    service::{InventoryAdjuster, InventoryAdjusterDeps, ProductQueryService},
};
use prometheus_client::registry::Registry;
use shared::config::ConnectionPool;
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct DependenciesInject {
    pub product_query: DynProductQueryService,
    pub inventory_adjuster: DynInventoryAdjuster,
    pub event_handler: Arc<OrderEventHandler>,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("product_query", &"ProductQueryService")
            .field("inventory_adjuster", &"InventoryAdjuster")
            .field("event_handler", &"OrderEventHandler")
            .finish()
    }
}

pub struct DependenciesInjectDeps {
    pub pool: ConnectionPool,
    pub underflow_policy: UnderflowPolicy,
    pub retry: RetryPolicy,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            pool,
            underflow_policy,
            retry,
        } = deps;

        let inventory_metrics = InventoryMetrics::new();
        inventory_metrics.register(registry);

        let query_repo = Arc::new(ProductQueryRepository::new(pool.clone()));
        let command_repo = Arc::new(ProductCommandRepository::new(pool));

        let product_query: DynProductQueryService =
            Arc::new(ProductQueryService::new(query_repo, registry));

        let adjuster_deps = InventoryAdjusterDeps {
            command: command_repo,
            policy: underflow_policy,
            inventory_metrics,
        };

        let inventory_adjuster: DynInventoryAdjuster =
            Arc::new(InventoryAdjuster::new(adjuster_deps, registry));

        let event_handler = Arc::new(OrderEventHandler::new(inventory_adjuster.clone(), retry));

        Self {
            product_query,
            inventory_adjuster,
            event_handler,
        }
    }
}
