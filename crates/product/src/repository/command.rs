use crate::{
    abstract_trait::product::repository::ProductCommandRepositoryTrait,
    domain::adjustment::{
        AdjustmentOutcome, AnomalyKind, StockAdjustment, StockLine, UnderflowPolicy,
        plan_deduction,
    },
    model::product::{InventoryAdjustment, StockLevel},
};
use async_trait::async_trait;
use shared::{config::ConnectionPool, domain::OrderEventType, errors::RepositoryError};
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, error, info};

pub struct ProductCommandRepository {
    db: ConnectionPool,
}

impl ProductCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

/// Claims the ledger slot for `(order_id, event_type)`. `false` means it was already taken.
async fn claim_event(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    event_type: OrderEventType,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r#"
        INSERT INTO processed_events (order_id, event_type)
        VALUES ($1, $2)
        ON CONFLICT (order_id, event_type) DO NOTHING
        "#,
    )
    .bind(order_id)
    .bind(event_type.as_str())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!(
            "❌ Failed to record {} event for order {}: {:?}",
            event_type, order_id, e
        );
        RepositoryError::from(e)
    })?;

    Ok(result.rows_affected() == 1)
}

async fn is_processed(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    event_type: OrderEventType,
) -> Result<bool, RepositoryError> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT order_id FROM processed_events
        WHERE order_id = $1 AND event_type = $2
        "#,
    )
    .bind(order_id)
    .bind(event_type.as_str())
    .fetch_optional(&mut **tx)
    .await
    .map_err(RepositoryError::from)?;

    Ok(row.is_some())
}

/// Row-locks the given SKUs in a fixed order so concurrent events touching overlapping SKUs
/// cannot deadlock.
async fn lock_stock(
    tx: &mut Transaction<'_, Postgres>,
    sku_codes: &[String],
) -> Result<HashMap<String, i32>, RepositoryError> {
    let rows = sqlx::query_as::<_, StockLevel>(
        r#"
        SELECT sku_code, quantity
        FROM products
        WHERE sku_code = ANY($1)
        ORDER BY sku_code
        FOR UPDATE
        "#,
    )
    .bind(sku_codes)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| {
        error!("❌ Failed to lock stock rows: {:?}", e);
        RepositoryError::from(e)
    })?;

    Ok(rows.into_iter().map(|r| (r.sku_code, r.quantity)).collect())
}

async fn shift_stock(
    tx: &mut Transaction<'_, Postgres>,
    sku_code: &str,
    delta: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity + $2,
            updated_at = current_timestamp
        WHERE sku_code = $1 AND quantity + $2 >= 0
        "#,
    )
    .bind(sku_code)
    .bind(delta)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!("❌ Failed to adjust stock of {} by {}: {:?}", sku_code, delta, e);
        RepositoryError::from(e)
    })?;

    if result.rows_affected() != 1 {
        return Err(RepositoryError::Conflict(format!(
            "stock of {sku_code} cannot move by {delta}"
        )));
    }

    Ok(())
}

async fn record_anomaly(
    tx: &mut Transaction<'_, Postgres>,
    order_id: i64,
    event_type: OrderEventType,
    adjustment: &StockAdjustment,
    kind: AnomalyKind,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO stock_anomalies (order_id, event_type, sku_code, kind, requested, applied)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(order_id)
    .bind(event_type.as_str())
    .bind(&adjustment.sku_code)
    .bind(kind.as_str())
    .bind(adjustment.requested)
    .bind(adjustment.applied)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        error!(
            "❌ Failed to record {} anomaly for order {}: {:?}",
            kind, order_id, e
        );
        RepositoryError::from(e)
    })?;

    Ok(())
}

#[async_trait]
impl ProductCommandRepositoryTrait for ProductCommandRepository {
    async fn apply_placed(
        &self,
        order_id: i64,
        lines: &[StockLine],
        policy: UnderflowPolicy,
    ) -> Result<AdjustmentOutcome, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        if !claim_event(&mut tx, order_id, OrderEventType::Placed).await? {
            tx.rollback().await.map_err(RepositoryError::from)?;
            debug!("PLACED event for order {} already applied", order_id);
            return Ok(AdjustmentOutcome::Duplicate);
        }

        if is_processed(&mut tx, order_id, OrderEventType::Cancelled).await? {
            tx.commit().await.map_err(RepositoryError::from)?;
            info!(
                "ℹ️ Order {} was cancelled before its placement arrived, stock left as is",
                order_id
            );
            return Ok(AdjustmentOutcome::Superseded);
        }

        let sku_codes: Vec<String> = lines.iter().map(|l| l.sku_code.clone()).collect();
        let on_hand = lock_stock(&mut tx, &sku_codes).await?;

        let adjustments = plan_deduction(lines, &on_hand, policy);

        for adjustment in &adjustments {
            if adjustment.applied > 0 {
                shift_stock(&mut tx, &adjustment.sku_code, -adjustment.applied).await?;
            }

            sqlx::query(
                r#"
                INSERT INTO inventory_adjustments (order_id, sku_code, requested, applied)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(&adjustment.sku_code)
            .bind(adjustment.requested)
            .bind(adjustment.applied)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(
                    "❌ Failed to store adjustment of {} for order {}: {:?}",
                    adjustment.sku_code, order_id, e
                );
                RepositoryError::from(e)
            })?;

            if let Some(kind) = adjustment.anomaly {
                record_anomaly(&mut tx, order_id, OrderEventType::Placed, adjustment, kind).await?;
            }
        }

        tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit stock deduction for order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        info!(
            "✅ Applied PLACED event for order {} across {} SKU(s)",
            order_id,
            adjustments.len()
        );

        Ok(AdjustmentOutcome::Applied { adjustments })
    }

    async fn apply_cancelled(&self, order_id: i64) -> Result<AdjustmentOutcome, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        if !claim_event(&mut tx, order_id, OrderEventType::Cancelled).await? {
            tx.rollback().await.map_err(RepositoryError::from)?;
            debug!("CANCELLED event for order {} already applied", order_id);
            return Ok(AdjustmentOutcome::Duplicate);
        }

        let deducted = sqlx::query_as::<_, InventoryAdjustment>(
            r#"
            SELECT order_id, sku_code, requested, applied
            FROM inventory_adjustments
            WHERE order_id = $1 AND applied > 0
            ORDER BY sku_code
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to load adjustments for order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        let sku_codes: Vec<String> = deducted.iter().map(|d| d.sku_code.clone()).collect();
        let on_hand = lock_stock(&mut tx, &sku_codes).await?;

        let mut adjustments = Vec::with_capacity(deducted.len());

        for row in deducted {
            if on_hand.contains_key(&row.sku_code) {
                shift_stock(&mut tx, &row.sku_code, row.applied).await?;
                adjustments.push(StockAdjustment {
                    sku_code: row.sku_code,
                    requested: row.applied,
                    applied: row.applied,
                    anomaly: None,
                });
            } else {
                let adjustment = StockAdjustment {
                    sku_code: row.sku_code,
                    requested: row.applied,
                    applied: 0,
                    anomaly: Some(AnomalyKind::UnknownSku),
                };
                record_anomaly(
                    &mut tx,
                    order_id,
                    OrderEventType::Cancelled,
                    &adjustment,
                    AnomalyKind::UnknownSku,
                )
                .await?;
                adjustments.push(adjustment);
            }
        }

        tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit stock restore for order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        info!(
            "✅ Applied CANCELLED event for order {}, restored {} SKU(s)",
            order_id,
            adjustments.len()
        );

        Ok(AdjustmentOutcome::Applied { adjustments })
    }
}
