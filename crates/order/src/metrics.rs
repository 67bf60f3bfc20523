use prometheus_client::{
    metrics::{
        counter::Counter,
        family::Family,
        histogram::{Histogram, exponential_buckets},
    },
    registry::Registry,
};
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum RejectReason {
    NoAvailableItems,
    UnknownSku,
    Validation,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RejectLabels {
    pub reason: RejectReason,
}

/// Domain counters for the order ledger. Built once in the dependency container and handed to
/// the services that record into it.
#[derive(Clone, Debug)]
pub struct OrderMetrics {
    placed: Counter,
    cancelled: Counter,
    rejected: Family<RejectLabels, Counter>,
    creation_duration: Histogram,
    outbox_published: Counter,
    outbox_publish_failures: Counter,
}

impl Default for OrderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderMetrics {
    pub fn new() -> Self {
        Self {
            placed: Counter::default(),
            cancelled: Counter::default(),
            rejected: Family::default(),
            creation_duration: Histogram::new(exponential_buckets(0.005, 2.0, 12)),
            outbox_published: Counter::default(),
            outbox_publish_failures: Counter::default(),
        }
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register("orders_placed", "Orders placed", self.placed.clone());
        registry.register("orders_cancelled", "Orders cancelled", self.cancelled.clone());
        registry.register(
            "orders_rejected",
            "Order drafts rejected before persistence",
            self.rejected.clone(),
        );
        registry.register(
            "order_creation_duration_seconds",
            "Time spent placing an order, availability check included",
            self.creation_duration.clone(),
        );
        registry.register(
            "outbox_published",
            "Outbox events acknowledged by the broker",
            self.outbox_published.clone(),
        );
        registry.register(
            "outbox_publish_failures",
            "Failed outbox publish attempts",
            self.outbox_publish_failures.clone(),
        );
    }

    pub fn order_placed(&self) {
        self.placed.inc();
    }

    pub fn order_cancelled(&self) {
        self.cancelled.inc();
    }

    pub fn order_rejected(&self, reason: RejectReason) {
        self.rejected.get_or_create(&RejectLabels { reason }).inc();
    }

    pub fn observe_creation(&self, duration_secs: f64) {
        self.creation_duration.observe(duration_secs);
    }

    pub fn outbox_published(&self) {
        self.outbox_published.inc();
    }

    pub fn outbox_publish_failed(&self) {
        self.outbox_publish_failures.inc();
    }
}
