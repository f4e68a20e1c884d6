use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::WebhookError;
use crate::services::webhook::SIGNATURE_HEADER;
use crate::AppState;

/// `POST /webhook`. Takes the raw body so the checksum covers the exact bytes sent.
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookError> {
    // A header that is present but not visible ASCII can never match.
    let signature = match headers.get(SIGNATURE_HEADER) {
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::warn!("Webhook rejected: undecodable {} header", SIGNATURE_HEADER);
            WebhookError::InvalidSignature
        })?),
        None => None,
    };

    state.webhooks.process(&body, signature).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "received": true,
        })),
    ))
}
