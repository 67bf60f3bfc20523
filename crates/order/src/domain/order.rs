use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::domain::{OrderEvent, OrderEventItem, OrderEventType};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLACED" => Ok(OrderStatus::Placed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// A line of an order. Never changes once the order is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub sku_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Largest amount a `NUMERIC(12, 2)` column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

impl OrderItem {
    /// `None` when `price * quantity` does not fit in a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Order aggregate: the order row and its items are always loaded and stored together.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    /// Builds the event describing this order. Items are copied from the persisted set so a
    /// cancellation reverses exactly what placement announced.
    pub fn to_event(&self, event_type: OrderEventType, emitted_at: DateTime<Utc>) -> OrderEvent {
        OrderEvent {
            order_id: self.id,
            event_type,
            order_items: self
                .items
                .iter()
                .map(|item| OrderEventItem {
                    sku_code: item.sku_code.clone(),
                    quantity: item.quantity,
                    product_name: item.product_name.clone(),
                    price: item.price,
                })
                .collect(),
            total_price: self.total_price,
            order_date: self.order_date,
            emitted_at,
        }
    }
}

/// Sum of the line totals, or `None` when it overflows or exceeds [`max_amount`].
pub fn total_price(items: &[OrderItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
        .filter(|total| *total <= max_amount())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn item(sku: &str, quantity: i32, price: Decimal) -> OrderItem {
        OrderItem {
            sku_code: sku.into(),
            product_name: sku.to_lowercase(),
            quantity,
            price,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let items = vec![item("IPHONE_15", 2, dec("999.99")), item("AIRPODS", 3, dec("129.50"))];
        assert_eq!(total_price(&items), Some(dec("2388.48")));
        assert_eq!(total_price(&[]), Some(Decimal::ZERO));
    }

    #[test]
    fn totals_that_do_not_fit_the_price_column_are_refused() {
        let huge = vec![item("IPHONE_15", 2, dec("50000000000000000000000000000"))];
        assert_eq!(huge[0].line_total(), None);
        assert_eq!(total_price(&huge), None);

        let too_wide = vec![
            item("IPHONE_15", 1, max_amount()),
            item("AIRPODS", 1, dec("0.01")),
        ];
        assert_eq!(total_price(&too_wide), None);
        assert_eq!(total_price(&too_wide[..1]), Some(max_amount()));
    }

    #[test]
    fn event_carries_persisted_items() {
        let order = Order {
            id: 9,
            status: OrderStatus::Cancelled,
            total_price: dec("1999.98"),
            order_date: Utc::now(),
            items: vec![item("IPHONE_15", 2, dec("999.99"))],
        };

        let event = order.to_event(OrderEventType::Cancelled, Utc::now());

        assert_eq!(event.order_id, 9);
        assert_eq!(event.partition_key(), "9");
        assert_eq!(event.order_items.len(), 1);
        assert_eq!(event.order_items[0].sku_code, "IPHONE_15");
        assert_eq!(event.order_items[0].quantity, 2);
        assert_eq!(event.total_price, dec("1999.98"));
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("CANCELLED".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("Order Cancelled".parse::<OrderStatus>().is_err());
        assert!("ORDER_CANCELLED".parse::<OrderStatus>().is_err());
    }
}
