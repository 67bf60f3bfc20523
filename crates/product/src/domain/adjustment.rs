use serde::{Deserialize, Serialize};
use shared::domain::OrderEventItem;
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// What the adjuster does when a placed order asks for more than is on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderflowPolicy {
    /// Leave the SKU untouched and queue the shortfall for reconciliation.
    #[default]
    Reject,
    /// Take whatever is on hand, driving the SKU to zero.
    Clamp,
}

#[derive(Debug, Error)]
#[error("unknown stock underflow policy '{0}', expected 'reject' or 'clamp'")]
pub struct UnknownPolicy(String);

impl FromStr for UnderflowPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnderflowPolicy::Reject),
            "clamp" => Ok(UnderflowPolicy::Clamp),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for UnderflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnderflowPolicy::Reject => f.write_str("reject"),
            UnderflowPolicy::Clamp => f.write_str("clamp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    InsufficientStock,
    UnknownSku,
    /// Same-SKU lines of one event summed past `i32::MAX`.
    QuantityOverflow,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::InsufficientStock => "INSUFFICIENT_STOCK",
            AnomalyKind::UnknownSku => "UNKNOWN_SKU",
            AnomalyKind::QuantityOverflow => "QUANTITY_OVERFLOW",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub sku_code: String,
    pub quantity: i32,
    /// Set when merging overflowed; `quantity` is then saturated and must not be applied.
    pub overflowed: bool,
}

/// One SKU's share of an applied event. `requested` is what the event asked for, `applied` is
/// what actually moved in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub sku_code: String,
    pub requested: i32,
    pub applied: i32,
    pub anomaly: Option<AnomalyKind>,
}

impl StockAdjustment {
    pub fn shortfall(&self) -> i32 {
        self.requested - self.applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentOutcome {
    Applied { adjustments: Vec<StockAdjustment> },
    /// The `(order_id, event_type)` pair was already in the ledger.
    Duplicate,
    /// A placement delivered after its cancellation; recorded without touching stock.
    Superseded,
}

impl AdjustmentOutcome {
    pub fn anomalies(&self) -> impl Iterator<Item = &StockAdjustment> {
        let adjustments: &[StockAdjustment] = match self {
            AdjustmentOutcome::Applied { adjustments } => adjustments,
            _ => &[],
        };
        adjustments.iter().filter(|a| a.anomaly.is_some())
    }
}

/// Folds event items into one line per SKU, keeping first-seen order.
pub fn merge_lines(items: &[OrderEventItem]) -> Vec<StockLine> {
    let mut lines: Vec<StockLine> = Vec::with_capacity(items.len());

    for item in items {
        match lines.iter_mut().find(|l| l.sku_code == item.sku_code) {
            Some(line) => match line.quantity.checked_add(item.quantity) {
                Some(sum) => line.quantity = sum,
                None => {
                    line.quantity = i32::MAX;
                    line.overflowed = true;
                }
            },
            None => lines.push(StockLine {
                sku_code: item.sku_code.clone(),
                quantity: item.quantity,
                overflowed: false,
            }),
        }
    }

    lines
}

/// Decides how much of each line to deduct given the locked on-hand quantities.
pub fn plan_deduction(
    lines: &[StockLine],
    on_hand: &HashMap<String, i32>,
    policy: UnderflowPolicy,
) -> Vec<StockAdjustment> {
    lines
        .iter()
        .map(|line| {
            if line.overflowed {
                return StockAdjustment {
                    sku_code: line.sku_code.clone(),
                    requested: line.quantity,
                    applied: 0,
                    anomaly: Some(AnomalyKind::QuantityOverflow),
                };
            }

            let Some(&available) = on_hand.get(&line.sku_code) else {
                return StockAdjustment {
                    sku_code: line.sku_code.clone(),
                    requested: line.quantity,
                    applied: 0,
                    anomaly: Some(AnomalyKind::UnknownSku),
                };
            };

            if available >= line.quantity {
                return StockAdjustment {
                    sku_code: line.sku_code.clone(),
                    requested: line.quantity,
                    applied: line.quantity,
                    anomaly: None,
                };
            }

            let applied = match policy {
                UnderflowPolicy::Reject => 0,
                UnderflowPolicy::Clamp => available.max(0),
            };

            StockAdjustment {
                sku_code: line.sku_code.clone(),
                requested: line.quantity,
                applied,
                anomaly: Some(AnomalyKind::InsufficientStock),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(sku: &str, quantity: i32) -> OrderEventItem {
        OrderEventItem {
            sku_code: sku.to_string(),
            quantity,
            product_name: sku.to_lowercase(),
            price: Decimal::ONE,
        }
    }

    fn line(sku: &str, quantity: i32) -> StockLine {
        StockLine {
            sku_code: sku.to_string(),
            quantity,
            overflowed: false,
        }
    }

    fn stock(entries: &[(&str, i32)]) -> HashMap<String, i32> {
        entries.iter().map(|(s, q)| (s.to_string(), *q)).collect()
    }

    #[test]
    fn duplicate_skus_are_merged_in_first_seen_order() {
        let lines = merge_lines(&[item("PIXEL_8", 1), item("IPHONE_15", 2), item("PIXEL_8", 3)]);

        assert_eq!(lines, vec![line("PIXEL_8", 4), line("IPHONE_15", 2)]);
    }

    #[test]
    fn overflowing_merge_is_flagged_and_never_applied() {
        let lines = merge_lines(&[
            item("IPHONE_15", 1_500_000_000),
            item("PIXEL_8", 1),
            item("IPHONE_15", 1_500_000_000),
        ]);

        assert!(lines[0].overflowed);
        assert_eq!(lines[0].quantity, i32::MAX);
        assert_eq!(lines[1], line("PIXEL_8", 1));

        let plan = plan_deduction(
            &lines,
            &stock(&[("IPHONE_15", i32::MAX), ("PIXEL_8", 5)]),
            UnderflowPolicy::Clamp,
        );

        assert_eq!(plan[0].applied, 0);
        assert_eq!(plan[0].anomaly, Some(AnomalyKind::QuantityOverflow));
        assert_eq!(plan[1].applied, 1);
        assert_eq!(plan[1].anomaly, None);
    }

    #[test]
    fn sufficient_stock_deducts_in_full() {
        let plan = plan_deduction(
            &[line("IPHONE_15", 2)],
            &stock(&[("IPHONE_15", 10)]),
            UnderflowPolicy::Reject,
        );

        assert_eq!(plan[0].applied, 2);
        assert_eq!(plan[0].anomaly, None);
    }

    #[test]
    fn reject_policy_leaves_short_sku_untouched() {
        let plan = plan_deduction(
            &[line("IPHONE_15", 5)],
            &stock(&[("IPHONE_15", 3)]),
            UnderflowPolicy::Reject,
        );

        assert_eq!(plan[0].applied, 0);
        assert_eq!(plan[0].shortfall(), 5);
        assert_eq!(plan[0].anomaly, Some(AnomalyKind::InsufficientStock));
    }

    #[test]
    fn clamp_policy_takes_what_is_on_hand() {
        let plan = plan_deduction(
            &[line("IPHONE_15", 5)],
            &stock(&[("IPHONE_15", 3)]),
            UnderflowPolicy::Clamp,
        );

        assert_eq!(plan[0].applied, 3);
        assert_eq!(plan[0].shortfall(), 2);
        assert_eq!(plan[0].anomaly, Some(AnomalyKind::InsufficientStock));
    }

    #[test]
    fn unknown_sku_is_an_anomaly_not_a_failure() {
        let plan = plan_deduction(
            &[line("GHOST", 1), line("PIXEL_8", 1)],
            &stock(&[("PIXEL_8", 1)]),
            UnderflowPolicy::Clamp,
        );

        assert_eq!(plan[0].anomaly, Some(AnomalyKind::UnknownSku));
        assert_eq!(plan[0].applied, 0);
        assert_eq!(plan[1].applied, 1);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Clamp".parse::<UnderflowPolicy>().ok(), Some(UnderflowPolicy::Clamp));
        assert_eq!(" reject ".parse::<UnderflowPolicy>().ok(), Some(UnderflowPolicy::Reject));
        assert!("ignore".parse::<UnderflowPolicy>().is_err());
    }
}
