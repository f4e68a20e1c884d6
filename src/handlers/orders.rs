use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::AppError;
use crate::AppState;

/// `GET /orders/:reference`, read-only status lookup for the storefront.
pub async fn get_order(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .orders
        .find_by_reference(&reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", reference)))?;

    Ok(Json(json!({
        "ok": true,
        "data": order,
    })))
}
