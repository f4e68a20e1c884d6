//! Postgres implementation of OrderStore.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Order, OrderStatus};
use crate::ports::{OrderStore, RepositoryError, RepositoryResult};

/// Postgres-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, reference, status, amount_in_cents, currency, customer_email,
                transaction_id, created_at, updated_at
            FROM orders WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.map(OrderRow::into_domain).transpose()
    }

    async fn set_paid_if_pending(&self, reference: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE reference = $1 AND status IN ($3, $4)
            "#,
        )
        .bind(reference)
        .bind(OrderStatus::Paid.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(OrderStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_failed_if_pending(&self, reference: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE reference = $1 AND status IN ($3, $4)
            "#,
        )
        .bind(reference)
        .bind(OrderStatus::Failed.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(OrderStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn attach_transaction(&self, reference: &str, transaction_id: &str) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET transaction_id = $2, updated_at = NOW()
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_pending(&self, order: &Order) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                id, reference, status, amount_in_cents, currency, customer_email,
                transaction_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(order.id)
        .bind(&order.reference)
        .bind(order.status.as_str())
        .bind(order.amount_in_cents)
        .bind(&order.currency)
        .bind(&order.customer_email)
        .bind(&order.transaction_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    reference: String,
    status: String,
    amount_in_cents: i64,
    currency: String,
    customer_email: String,
    transaction_id: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_domain(self) -> RepositoryResult<Order> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(Order {
            id: self.id,
            reference: self.reference,
            status,
            amount_in_cents: self.amount_in_cents,
            currency: self.currency,
            customer_email: self.customer_email,
            transaction_id: self.transaction_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
