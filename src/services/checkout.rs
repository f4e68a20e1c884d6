//! Transaction submission: validate, sign, record the pending order, fetch
//! an acceptance token, create.
//!
//! A failed creation is never retried here. Only the acceptance-token lookup
//! retries, because repeating `POST /transactions` risks a double charge.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::Order;
use crate::error::{CheckoutError, GatewayError, GatewayErrorKind};
use crate::ports::OrderStore;
use crate::services::acceptance::AcceptanceTokenFetcher;
use crate::utils::sanitize::sanitize_json;
use crate::validation::{self, ValidationError, CARD_PAYMENT_TYPE};
use crate::wompi::signature::{self, SignatureError};
use crate::wompi::types::{CustomerData, PaymentMethod, TransactionRequest};
use crate::wompi::{WompiClient, WompiError};

pub const COUNTRY_CODE: &str = "57";
pub const DEFAULT_LEGAL_ID_TYPE: &str = "CC";
pub const DEFAULT_INSTALLMENTS: u32 = 1;
pub const CONFIRMATION_PATH: &str = "order-confirmation";

/// Client checkout payload, read only after validation accepted it.
#[derive(Debug, Deserialize)]
struct CheckoutPayload {
    amount_in_cents: Value,
    currency: String,
    customer_email: String,
    payment_method: CheckoutPaymentMethod,
    reference: String,
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    customer_data: Option<CheckoutCustomer>,
}

#[derive(Debug, Deserialize)]
struct CheckoutPaymentMethod {
    token: String,
    #[serde(default)]
    installments: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckoutCustomer {
    full_name: String,
    phone_number: String,
    legal_id: String,
    #[serde(default)]
    legal_id_type: Option<String>,
}

/// Normalized transaction, everything except the per-attempt credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub amount_in_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub payment_method: PaymentMethod,
    pub reference: String,
    pub redirect_url: String,
    pub customer_data: Option<CustomerData>,
}

impl NormalizedTransaction {
    pub fn into_request(self, acceptance_token: String, signature: String) -> TransactionRequest {
        TransactionRequest {
            acceptance_token,
            amount_in_cents: self.amount_in_cents,
            currency: self.currency,
            signature,
            customer_email: self.customer_email,
            payment_method: self.payment_method,
            reference: self.reference,
            redirect_url: self.redirect_url,
            customer_data: self.customer_data,
        }
    }
}

/// A transaction the gateway created for a checkout.
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub transaction_id: String,
    pub reference: String,
    pub data: Value,
}

/// Validates and normalizes a raw payload.
pub fn normalize_payload(
    payload: &Value,
    frontend_url: &str,
) -> Result<NormalizedTransaction, CheckoutError> {
    let errors = validation::validate_transaction_payload(payload);
    if !errors.is_empty() {
        return Err(CheckoutError::Validation(errors));
    }

    let payload: CheckoutPayload = serde_json::from_value(payload.clone()).map_err(|e| {
        CheckoutError::Validation(vec![ValidationError::new("payload", e.to_string())])
    })?;

    let reference = payload.reference;
    let redirect_url = payload
        .redirect_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| default_redirect_url(frontend_url, &reference));

    let amount_in_cents = whole_field(&payload.amount_in_cents, "amount_in_cents")?;
    let installments = match validation::present(payload.payment_method.installments.as_ref()) {
        None => DEFAULT_INSTALLMENTS,
        Some(value) => u32::try_from(whole_field(value, "payment_method.installments")?)
            .map_err(|_| {
                CheckoutError::Validation(vec![ValidationError::new(
                    "payment_method.installments",
                    "out of range",
                )])
            })?,
    };

    Ok(NormalizedTransaction {
        amount_in_cents,
        currency: payload.currency,
        customer_email: payload.customer_email.trim().to_lowercase(),
        payment_method: PaymentMethod {
            kind: payload
                .payment_method
                .kind
                .unwrap_or_else(|| CARD_PAYMENT_TYPE.to_string()),
            token: payload.payment_method.token.trim().to_string(),
            installments,
        },
        redirect_url,
        reference,
        customer_data: payload.customer_data.map(|customer| CustomerData {
            phone_number: normalize_phone(&customer.phone_number),
            full_name: customer.full_name.trim().to_string(),
            legal_id: customer.legal_id.trim().to_string(),
            legal_id_type: customer
                .legal_id_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_LEGAL_ID_TYPE.to_string()),
        }),
    })
}

/// Exact integer read of a numeric field, so large amounts are never rounded through f64.
fn whole_field(value: &Value, field: &'static str) -> Result<i64, CheckoutError> {
    validation::whole_number(value).ok_or_else(|| {
        CheckoutError::Validation(vec![ValidationError::new(field, "must be an integer")])
    })
}

/// Keeps digits only and prefixes the Colombian country code when absent.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
    // A bare national number is ten digits; anything longer starting with 57 is already prefixed.
    if digits.starts_with(COUNTRY_CODE) && digits.len() > 10 {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

/// `{frontend}/order-confirmation/{last '-' segment of the reference}`.
pub fn default_redirect_url(frontend_url: &str, reference: &str) -> String {
    let order_id = reference.rsplit('-').next().unwrap_or(reference);
    format!(
        "{}/{}/{}",
        frontend_url.trim_end_matches('/'),
        CONFIRMATION_PATH,
        order_id
    )
}

pub struct TransactionSubmitter {
    client: WompiClient,
    tokens: AcceptanceTokenFetcher,
    orders: Arc<dyn OrderStore>,
    merchant_id: String,
    integrity_secret: Option<String>,
    frontend_url: String,
}

impl TransactionSubmitter {
    pub fn new(
        client: WompiClient,
        tokens: AcceptanceTokenFetcher,
        orders: Arc<dyn OrderStore>,
        merchant_id: String,
        integrity_secret: Option<String>,
        frontend_url: String,
    ) -> Self {
        Self {
            client,
            tokens,
            orders,
            merchant_id,
            integrity_secret,
            frontend_url,
        }
    }

    pub async fn submit(&self, payload: &Value) -> Result<SubmittedTransaction, CheckoutError> {
        tracing::debug!(payload = %sanitize_json(payload), "Checkout payload received");

        let normalized = normalize_payload(payload, &self.frontend_url).map_err(|err| {
            if let CheckoutError::Validation(errors) = &err {
                tracing::info!(violations = errors.len(), "Checkout payload rejected");
            }
            err
        })?;

        // Signed before any network call so a missing secret never reaches the gateway.
        let secret = self.integrity_secret.as_deref().unwrap_or_default();
        let signature = signature::sign_transaction(
            &normalized.reference,
            normalized.amount_in_cents,
            &normalized.currency,
            secret,
        )
        .map_err(|err| {
            if err == SignatureError::MissingSecret {
                tracing::error!("WOMPI_INTEGRITY_SECRET is not configured; refusing to submit");
            }
            err
        })?;

        // The order must exist before the gateway can send an event for it.
        self.record_pending_order(&normalized).await?;
        let reference = normalized.reference.clone();
        let amount_in_cents = normalized.amount_in_cents;

        let token = match self.tokens.fetch(&self.merchant_id).await {
            Ok(token) => token,
            Err(err) => {
                self.fail_order(&reference).await;
                return Err(GatewayError::new(
                    GatewayErrorKind::TokenUnavailable,
                    "Could not obtain an acceptance token from the payment gateway",
                )
                .with_details(Value::String(err.to_string()))
                .into());
            }
        };

        let request = normalized.into_request(token.into_inner(), signature);
        let created = match self.client.create_transaction(&request).await {
            Ok(created) => created,
            Err(err) => {
                // Only a 4xx proves no transaction exists; otherwise an event may still settle it.
                if matches!(&err, WompiError::Status { status, .. } if (400..500).contains(status)) {
                    self.fail_order(&reference).await;
                }
                return Err(classify_gateway_error(&reference, err).into());
            }
        };

        tracing::info!(
            reference = %reference,
            transaction_id = %created.id,
            amount_in_cents,
            "Transaction created"
        );

        match self.orders.attach_transaction(&reference, &created.id).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(reference = %reference, "Order vanished before transaction id was stored"),
            Err(e) => tracing::error!(
                reference = %reference,
                transaction_id = %created.id,
                error = %e,
                "Failed to store transaction id"
            ),
        }

        Ok(SubmittedTransaction {
            transaction_id: created.id,
            reference,
            data: created.data,
        })
    }

    async fn record_pending_order(&self, normalized: &NormalizedTransaction) -> Result<(), CheckoutError> {
        let order = Order::pending(
            normalized.reference.clone(),
            normalized.amount_in_cents,
            normalized.currency.clone(),
            normalized.customer_email.clone(),
            None,
        );

        let inserted = self.orders.insert_pending(&order).await.map_err(|e| {
            tracing::error!(reference = %order.reference, error = %e, "Failed to record pending order");
            CheckoutError::from(e)
        })?;

        if !inserted {
            tracing::info!(reference = %order.reference, "Checkout reference already used");
            return Err(CheckoutError::Validation(vec![ValidationError::new(
                "reference",
                "is already used by another order",
            )]));
        }

        tracing::info!(reference = %order.reference, "Pending order recorded");
        Ok(())
    }

    async fn fail_order(&self, reference: &str) {
        match self.orders.set_failed_if_pending(reference).await {
            Ok(true) => tracing::info!(reference, "Order marked as failed"),
            Ok(false) => {}
            Err(e) => tracing::error!(reference, error = %e, "Failed to mark order failed"),
        }
    }
}

fn classify_gateway_error(reference: &str, err: WompiError) -> GatewayError {
    match err {
        WompiError::Status { status: 422, body } => {
            tracing::warn!(reference, body = %body, "Gateway rejected transaction");
            let details = body.get("error").cloned().unwrap_or(body);
            GatewayError::new(
                GatewayErrorKind::GatewayRejected,
                "The payment gateway rejected the transaction",
            )
            .with_status(422)
            .with_details(details)
        }
        WompiError::Status { status, body } => {
            tracing::error!(reference, status, body = %body, "Unexpected gateway status");
            GatewayError::new(GatewayErrorKind::Unknown, "Payment gateway error")
                .with_status(status)
                .with_details(body)
        }
        WompiError::InvalidResponse(msg) => {
            tracing::error!(reference, error = %msg, "Gateway response missing transaction id");
            GatewayError::new(
                GatewayErrorKind::InvalidResponse,
                "The payment gateway returned an unexpected response",
            )
        }
        err @ WompiError::RequestError(_) => {
            tracing::error!(
                reference,
                timeout = err.is_timeout(),
                error = %err,
                "Gateway request failed"
            );
            GatewayError::new(GatewayErrorKind::Unknown, "Payment gateway unavailable")
        }
    }
}
