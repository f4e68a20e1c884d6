//! Order domain entity.
//! Orders are created pending at checkout and settle as paid or failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Paid,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    /// Statuses an approved payment may move to `Paid`.
    pub fn awaits_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "paid" | "completed" => Ok(OrderStatus::Paid),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub reference: String,
    pub status: OrderStatus,
    pub amount_in_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn pending(
        reference: String,
        amount_in_cents: i64,
        currency: String,
        customer_email: String,
        transaction_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference,
            status: OrderStatus::Pending,
            amount_in_cents,
            currency,
            customer_email,
            transaction_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Conditional transition to `Paid`. Returns whether the status changed.
    pub fn mark_paid(&mut self) -> bool {
        if !self.status.awaits_payment() {
            return false;
        }
        self.status = OrderStatus::Paid;
        self.updated_at = Utc::now();
        true
    }

    /// Conditional transition to `Failed`; a paid order is never downgraded.
    pub fn mark_failed(&mut self) -> bool {
        if !self.status.awaits_payment() {
            return false;
        }
        self.status = OrderStatus::Failed;
        self.updated_at = Utc::now();
        true
    }

    /// Records the gateway transaction id without touching the status.
    pub fn attach_transaction(&mut self, transaction_id: &str) {
        self.transaction_id = Some(transaction_id.to_string());
        self.updated_at = Utc::now();
    }
}
