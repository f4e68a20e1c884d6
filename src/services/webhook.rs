//! Inbound event processing.
//!
//! A notification moves through `Unverified -> Verified -> Parsed -> Applied`.
//! Verification works on the untouched body bytes and happens before any
//! parsing; a rejected notification never touches the order store.

use serde_json::Value;
use std::sync::Arc;

use crate::error::WebhookError;
use crate::ports::OrderStore;
use crate::wompi::signature::{self, SignatureError};
use crate::wompi::types::{EventEnvelope, TransactionEventData, EVENT_TRANSACTION_UPDATED};

pub const SIGNATURE_HEADER: &str = "x-event-checksum";

/// What an acknowledged notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order moved to paid on this delivery.
    OrderPaid { reference: String },
    /// The order had already left the pending states; nothing changed.
    AlreadyApplied { reference: String, status: String },
    /// No order matches the reference.
    OrderNotFound { reference: String },
    /// Event type or transaction status that requires no state change.
    Ignored { event: String, status: Option<String> },
}

pub struct WebhookProcessor {
    secret: Option<String>,
    orders: Arc<dyn OrderStore>,
}

impl WebhookProcessor {
    pub fn new(secret: Option<String>, orders: Arc<dyn OrderStore>) -> Self {
        Self { secret, orders }
    }

    pub async fn process(
        &self,
        raw_body: &[u8],
        received_signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.verify(raw_body, received_signature)?;

        let event = parse_event(raw_body)?;
        let outcome = self.apply(event).await?;

        tracing::info!(outcome = ?outcome, "Webhook acknowledged");
        Ok(outcome)
    }

    fn verify(&self, raw_body: &[u8], received_signature: Option<&str>) -> Result<(), WebhookError> {
        signature::check_webhook_signature(raw_body, received_signature, self.secret.as_deref())
            .map_err(|err| {
                match err {
                    SignatureError::MissingSecret => {
                        tracing::error!("Webhook secret is not configured; rejecting notification")
                    }
                    SignatureError::MissingSignature => {
                        tracing::warn!("Webhook rejected: missing {} header", SIGNATURE_HEADER)
                    }
                    SignatureError::InvalidSignature => {
                        tracing::warn!(body_len = raw_body.len(), "Webhook rejected: signature mismatch");
                        if let (Some(secret), Some(received)) = (self.secret.as_deref(), received_signature) {
                            if let Ok(expected) = signature::sign_webhook(raw_body, secret) {
                                tracing::debug!(%expected, received, "Webhook signature comparison");
                            }
                        }
                    }
                }
                WebhookError::from(err)
            })
    }

    async fn apply(&self, event: EventEnvelope) -> Result<WebhookOutcome, WebhookError> {
        if event.event != EVENT_TRANSACTION_UPDATED {
            return Ok(WebhookOutcome::Ignored {
                event: event.event,
                status: None,
            });
        }

        let data: TransactionEventData = serde_json::from_value(event.data).map_err(|e| {
            tracing::error!(error = %e, "Malformed transaction.updated payload");
            WebhookError::Processing(format!("malformed transaction data: {}", e))
        })?;
        let transaction = data.transaction;

        if !transaction.is_approved() {
            tracing::info!(
                reference = %transaction.reference,
                status = %transaction.status,
                "Transaction update requires no change"
            );
            return Ok(WebhookOutcome::Ignored {
                event: event.event,
                status: Some(transaction.status),
            });
        }

        let reference = transaction.reference;
        if self.orders.set_paid_if_pending(&reference).await.map_err(|e| {
            tracing::error!(reference = %reference, error = %e, "Failed to mark order paid");
            WebhookError::from(e)
        })? {
            tracing::info!(
                reference = %reference,
                transaction_id = ?transaction.id,
                "Order marked as paid"
            );
            return Ok(WebhookOutcome::OrderPaid { reference });
        }

        match self.orders.find_by_reference(&reference).await? {
            Some(order) => {
                tracing::info!(
                    reference = %reference,
                    status = %order.status,
                    "Approved payment already applied"
                );
                Ok(WebhookOutcome::AlreadyApplied {
                    reference,
                    status: order.status.to_string(),
                })
            }
            None => {
                tracing::warn!(reference = %reference, "Approved payment for unknown order");
                Ok(WebhookOutcome::OrderNotFound { reference })
            }
        }
    }
}

fn parse_event(raw_body: &[u8]) -> Result<EventEnvelope, WebhookError> {
    let value: Value = serde_json::from_slice(raw_body).map_err(|e| {
        tracing::error!(error = %e, "Verified webhook body is not valid JSON");
        WebhookError::Processing(format!("invalid JSON body: {}", e))
    })?;

    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, "Verified webhook body is not an event");
        WebhookError::Processing(format!("invalid event envelope: {}", e))
    })
}
