use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::ports::RepositoryError;
use crate::validation::ValidationError;
use crate::wompi::SignatureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    TokenUnavailable,
    GatewayRejected,
    InvalidResponse,
    Unknown,
}

impl GatewayErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayErrorKind::TokenUnavailable => "TOKEN_UNAVAILABLE",
            GatewayErrorKind::GatewayRejected => "GATEWAY_REJECTED",
            GatewayErrorKind::InvalidResponse => "INVALID_RESPONSE",
            GatewayErrorKind::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Error, Debug)]
#[error("{message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    /// Status reported by the gateway, when it answered at all.
    pub status: Option<u16>,
    pub message: String,
    pub details: Option<Value>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Outcome of a failed `/create-transaction` request.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Invalid transaction payload")]
    Validation(Vec<ValidationError>),

    #[error("Transaction signing failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Order storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl CheckoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::Signature(_) | CheckoutError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CheckoutError::Gateway(err) => match err.kind {
                GatewayErrorKind::TokenUnavailable | GatewayErrorKind::InvalidResponse => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                GatewayErrorKind::GatewayRejected => StatusCode::UNPROCESSABLE_ENTITY,
                GatewayErrorKind::Unknown => err
                    .status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            },
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            CheckoutError::Validation(errors) => json!({
                "ok": false,
                "error": self.to_string(),
                "details": errors,
            }),
            CheckoutError::Signature(_) => json!({
                "ok": false,
                "error": "Payment signing is not available",
            }),
            CheckoutError::Storage(_) => json!({
                "ok": false,
                "error": "Order could not be recorded",
            }),
            CheckoutError::Gateway(err) => {
                let mut body = json!({
                    "ok": false,
                    "error": err.message,
                    "code": err.kind.as_str(),
                });
                if let Some(details) = &err.details {
                    body["details"] = details.clone();
                }
                body
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Failure of an inbound event notification.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Webhook processing failed: {0}")]
    Processing(String),
}

impl WebhookError {
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::Processing(_) => "PROCESSING_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SignatureError> for WebhookError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::MissingSignature => WebhookError::MissingSignature,
            // A missing secret fails closed like a mismatch.
            SignatureError::InvalidSignature | SignatureError::MissingSecret => {
                WebhookError::InvalidSignature
            }
        }
    }
}

impl From<RepositoryError> for WebhookError {
    fn from(err: RepositoryError) -> Self {
        WebhookError::Processing(err.to_string())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => json!({
                "success": false,
                "error": self.to_string(),
                "code": self.code(),
            }),
            WebhookError::Processing(details) => json!({
                "success": false,
                "error": "Webhook processing failed",
                "details": details,
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFound(what),
            RepositoryError::Database(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "ok": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status_code() {
        let error = CheckoutError::Validation(vec![ValidationError::new("currency", "must be COP")]);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_error_status_code() {
        let error = CheckoutError::from(RepositoryError::Database("connection reset".to_string()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_signature_error_status_code() {
        let error = CheckoutError::from(SignatureError::MissingSecret);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_gateway_error_status_codes() {
        let token = CheckoutError::from(GatewayError::new(GatewayErrorKind::TokenUnavailable, "x"));
        assert_eq!(token.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let rejected = CheckoutError::from(
            GatewayError::new(GatewayErrorKind::GatewayRejected, "x").with_status(422),
        );
        assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid = CheckoutError::from(
            GatewayError::new(GatewayErrorKind::InvalidResponse, "x").with_status(201),
        );
        assert_eq!(invalid.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unknown_gateway_error_uses_gateway_status() {
        let error = CheckoutError::from(
            GatewayError::new(GatewayErrorKind::Unknown, "x").with_status(401),
        );
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);

        let no_status = CheckoutError::from(GatewayError::new(GatewayErrorKind::Unknown, "x"));
        assert_eq!(no_status.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let redirect = CheckoutError::from(
            GatewayError::new(GatewayErrorKind::Unknown, "x").with_status(302),
        );
        assert_eq!(redirect.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_webhook_error_codes() {
        assert_eq!(WebhookError::MissingSignature.code(), "MISSING_SIGNATURE");
        assert_eq!(WebhookError::InvalidSignature.code(), "INVALID_SIGNATURE");
        assert_eq!(
            WebhookError::Processing("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_secret_fails_closed_as_invalid_signature() {
        let error = WebhookError::from(SignatureError::MissingSecret);
        assert!(matches!(error, WebhookError::InvalidSignature));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_not_found_error_response() {
        let error = AppError::NotFound("Order ORDER-404 not found".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_error_response_status() {
        let response = WebhookError::InvalidSignature.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
