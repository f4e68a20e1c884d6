use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::ports::OrderStore;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, DependencyStatus::Healthy { .. })
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
}

pub struct OrderStoreChecker {
    orders: Arc<dyn OrderStore>,
}

impl OrderStoreChecker {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl DependencyChecker for OrderStoreChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match timeout(CHECK_TIMEOUT, self.orders.ping()).await {
            Ok(Ok(())) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Ok(Err(e)) => DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: e.to_string(),
            },
            Err(_) => DependencyStatus::Unhealthy {
                status: "unhealthy".to_string(),
                error: format!("timed out after {}s", CHECK_TIMEOUT.as_secs()),
            },
        }
    }
}

pub async fn check_health(
    checkers: &[(&str, &dyn DependencyChecker)],
    start_time: Instant,
) -> HealthResponse {
    let mut dependencies = HashMap::new();
    for (name, checker) in checkers {
        dependencies.insert(name.to_string(), checker.check().await);
    }

    let status = if dependencies.values().all(DependencyStatus::is_healthy) {
        "healthy"
    } else {
        "unhealthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies,
    }
}
