//! Wire types exchanged with the Wompi API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_TRANSACTION_UPDATED: &str = "transaction.updated";
pub const STATUS_APPROVED: &str = "APPROVED";

/// Body of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub acceptance_token: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub signature: String,
    pub customer_email: String,
    pub payment_method: PaymentMethod,
    pub reference: String,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<CustomerData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    pub installments: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerData {
    pub phone_number: String,
    pub full_name: String,
    pub legal_id: String,
    pub legal_id_type: String,
}

/// A transaction the gateway accepted for processing.
#[derive(Debug, Clone)]
pub struct CreatedTransaction {
    pub id: String,
    /// The gateway's `data` object, passed through to the client.
    pub data: Value,
}

/// Envelope of every event notification.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub sent_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEventData {
    pub transaction: EventTransaction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTransaction {
    #[serde(default)]
    pub id: Option<String>,
    pub reference: String,
    pub status: String,
}

impl EventTransaction {
    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }
}
