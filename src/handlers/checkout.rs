use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::CheckoutError;
use crate::validation::ValidationError;
use crate::AppState;

/// `POST /create-transaction`
pub async fn create_transaction(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, CheckoutError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|_| {
        CheckoutError::Validation(vec![ValidationError::new(
            "payload",
            "must be a valid JSON object",
        )])
    })?;

    let submitted = state.submitter.submit(&payload).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "data": submitted.data,
        })),
    ))
}
