pub mod checkout;
pub mod orders;
pub mod webhook;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::health::{check_health, DependencyChecker, OrderStoreChecker};
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let order_store = OrderStoreChecker::new(state.orders.clone());
    let checkers: [(&str, &dyn DependencyChecker); 1] = [("order_store", &order_store)];
    let health = check_health(&checkers, state.start_time).await;

    // Return 503 if a dependency is down, 200 otherwise
    let status_code = if health.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}
