use crate::domain::adjustment::AnomalyKind;
use prometheus_client::{
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};
use shared::domain::OrderEventType;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum EventTypeLabel {
    Placed,
    Cancelled,
}

impl From<OrderEventType> for EventTypeLabel {
    fn from(value: OrderEventType) -> Self {
        match value {
            OrderEventType::Placed => EventTypeLabel::Placed,
            OrderEventType::Cancelled => EventTypeLabel::Cancelled,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EventLabels {
    pub event_type: EventTypeLabel,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum AnomalyLabel {
    InsufficientStock,
    UnknownSku,
    QuantityOverflow,
}

impl From<AnomalyKind> for AnomalyLabel {
    fn from(value: AnomalyKind) -> Self {
        match value {
            AnomalyKind::InsufficientStock => AnomalyLabel::InsufficientStock,
            AnomalyKind::UnknownSku => AnomalyLabel::UnknownSku,
            AnomalyKind::QuantityOverflow => AnomalyLabel::QuantityOverflow,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct AnomalyLabels {
    pub kind: AnomalyLabel,
}

#[derive(Clone, Debug, Default)]
pub struct InventoryMetrics {
    applied: Family<EventLabels, Counter>,
    duplicates: Family<EventLabels, Counter>,
    anomalies: Family<AnomalyLabels, Counter>,
}

impl InventoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "inventory_events_applied",
            "Order events applied to the inventory store",
            self.applied.clone(),
        );
        registry.register(
            "inventory_events_duplicate",
            "Redelivered order events discarded by the idempotency ledger",
            self.duplicates.clone(),
        );
        registry.register(
            "inventory_stock_anomalies",
            "SKU adjustments that could not be applied in full",
            self.anomalies.clone(),
        );
    }

    pub fn event_applied(&self, event_type: OrderEventType) {
        self.applied
            .get_or_create(&EventLabels {
                event_type: event_type.into(),
            })
            .inc();
    }

    pub fn event_duplicate(&self, event_type: OrderEventType) {
        self.duplicates
            .get_or_create(&EventLabels {
                event_type: event_type.into(),
            })
            .inc();
    }

    pub fn anomaly(&self, kind: AnomalyKind) {
        self.anomalies
            .get_or_create(&AnomalyLabels { kind: kind.into() })
            .inc();
    }
}
