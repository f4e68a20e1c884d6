//! Acceptance-token retrieval with bounded linear backoff.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::wompi::{WompiClient, WompiError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_STEP: Duration = Duration::from_millis(1000);

/// Suspension point for retry loops, injectable so tests run without delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Opaque, short-lived token. Only ever used for the attempt that fetched it.
#[derive(Clone, PartialEq, Eq)]
pub struct AcceptanceToken(String);

impl AcceptanceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AcceptanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AcceptanceToken(****)")
    }
}

#[derive(Error, Debug)]
#[error("Acceptance token unavailable after {attempts} attempt(s): {source}")]
pub struct AcceptanceTokenError {
    pub attempts: u32,
    #[source]
    pub source: WompiError,
}

/// Runs `op` up to `max_attempts` times, sleeping `attempt * step` after each
/// failure except the last. Returns the last error with the attempt count.
pub async fn retry_with_linear_backoff<T, E, F, Fut>(
    max_attempts: u32,
    step: Duration,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, (u32, E)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => return Err((attempt, err)),
            Err(err) => {
                let delay = step * attempt;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, backing off"
                );
                sleeper.sleep(delay).await;
            }
        }
    }
}

#[derive(Clone)]
pub struct AcceptanceTokenFetcher {
    client: WompiClient,
    sleeper: Arc<dyn Sleeper>,
    max_attempts: u32,
    backoff_step: Duration,
}

impl AcceptanceTokenFetcher {
    pub fn with_sleeper(client: WompiClient, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            client,
            sleeper,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub async fn fetch(&self, merchant_id: &str) -> Result<AcceptanceToken, AcceptanceTokenError> {
        let client = &self.client;
        let result = retry_with_linear_backoff(
            self.max_attempts,
            self.backoff_step,
            self.sleeper.as_ref(),
            |attempt| async move {
                tracing::debug!(attempt, merchant_id, "Fetching acceptance token");
                client.get_acceptance_token(merchant_id).await
            },
        )
        .await;

        match result {
            Ok(token) => Ok(AcceptanceToken(token)),
            Err((attempts, source)) => {
                tracing::error!(attempts, error = %source, "Acceptance token retries exhausted");
                Err(AcceptanceTokenError { attempts, source })
            }
        }
    }
}
