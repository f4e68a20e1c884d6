pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ports;
pub mod services;
pub mod utils;
pub mod validation;
pub mod wompi;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::ports::OrderStore;
use crate::services::{
    AcceptanceTokenFetcher, Sleeper, TokioSleeper, TransactionSubmitter, WebhookProcessor,
};
use crate::wompi::WompiClient;

/// Shared request state. Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub submitter: Arc<TransactionSubmitter>,
    pub webhooks: Arc<WebhookProcessor>,
    pub orders: Arc<dyn OrderStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, orders: Arc<dyn OrderStore>) -> Self {
        Self::with_sleeper(config, orders, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        config: Config,
        orders: Arc<dyn OrderStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let client = WompiClient::new(
            config.wompi_api_url.clone(),
            config.wompi_private_key.clone(),
        );
        let tokens = AcceptanceTokenFetcher::with_sleeper(client.clone(), sleeper);
        let submitter = TransactionSubmitter::new(
            client,
            tokens,
            orders.clone(),
            config.wompi_public_key.clone(),
            config.wompi_integrity_secret.clone(),
            config.frontend_url.clone(),
        );
        let webhooks = WebhookProcessor::new(
            config.webhook_secret().map(str::to_string),
            orders.clone(),
        );

        Self {
            submitter: Arc::new(submitter),
            webhooks: Arc::new(webhooks),
            orders,
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/create-transaction",
            post(handlers::checkout::create_transaction),
        )
        .route("/webhook", post(handlers::webhook::receive_event))
        .route("/orders/:reference", get(handlers::orders::get_order))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
