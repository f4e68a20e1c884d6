use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::types::{CreatedTransaction, TransactionRequest};

pub const ACCEPTANCE_TOKEN_TIMEOUT: Duration = Duration::from_secs(5);
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum WompiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Wompi responded with status {status}")]
    Status { status: u16, body: Value },

    #[error("Invalid response from Wompi: {0}")]
    InvalidResponse(String),
}

impl WompiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WompiError::RequestError(e) if e.is_timeout())
    }
}

/// HTTP client for the Wompi API. Each call is a single attempt.
#[derive(Clone)]
pub struct WompiClient {
    client: Client,
    base_url: String,
    private_key: String,
    token_timeout: Duration,
    transaction_timeout: Duration,
}

impl WompiClient {
    pub fn new(base_url: String, private_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            private_key,
            token_timeout: ACCEPTANCE_TOKEN_TIMEOUT,
            transaction_timeout: TRANSACTION_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, token_timeout: Duration, transaction_timeout: Duration) -> Self {
        self.token_timeout = token_timeout;
        self.transaction_timeout = transaction_timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Reads `data.presigned_acceptance.acceptance_token` from `GET /merchants/{id}`.
    pub async fn get_acceptance_token(&self, merchant_id: &str) -> Result<String, WompiError> {
        let response = self
            .client
            .get(self.url(&format!("merchants/{}", merchant_id)))
            .timeout(self.token_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(WompiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        body.pointer("/data/presigned_acceptance/acceptance_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                WompiError::InvalidResponse(
                    "missing data.presigned_acceptance.acceptance_token".to_string(),
                )
            })
    }

    /// `POST /transactions` authenticated with the merchant's private key.
    pub async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<CreatedTransaction, WompiError> {
        let response = self
            .client
            .post(self.url("transactions"))
            .bearer_auth(&self.private_key)
            .timeout(self.transaction_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(WompiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| WompiError::InvalidResponse(e.to_string()))?;

        let id = match body.pointer("/data/id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(WompiError::InvalidResponse("missing data.id".to_string())),
        };

        Ok(CreatedTransaction {
            id,
            data: body.get("data").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Error bodies are kept as JSON when possible, otherwise wrapped as a string.
async fn read_body(response: reqwest::Response) -> Value {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(_) => Value::Null,
    }
}
