//! OrderStore port - persistence owned outside the checkout core.
//!
//! Webhooks are delivered at least once, so `set_paid_if_pending` must be a
//! single conditional update keyed by reference. Two concurrent deliveries
//! for the same reference can then never both report a transition.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Order;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>>;

    /// Moves a pending or processing order to paid.
    /// Returns `true` only for the call that performed the transition.
    async fn set_paid_if_pending(&self, reference: &str) -> RepositoryResult<bool>;

    /// Moves a pending or processing order to failed. Never touches a paid order.
    async fn set_failed_if_pending(&self, reference: &str) -> RepositoryResult<bool>;

    /// Stores the gateway transaction id; the status is left as is.
    /// Returns `false` when no order has this reference.
    async fn attach_transaction(&self, reference: &str, transaction_id: &str) -> RepositoryResult<bool>;

    /// Records a new order. Returns `false` when the reference already exists,
    /// in which case the stored order is left untouched.
    async fn insert_pending(&self, order: &Order) -> RepositoryResult<bool>;

    async fn ping(&self) -> RepositoryResult<()>;
}
