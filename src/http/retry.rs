use std::{future::Future, time::Duration};

use rand::Rng;

use crate::configuration::Retry;

use super::HttpError;

/// Jittered exponential backoff for idempotent reads that never got a response.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ceiling = (exponential.as_millis() as u64 / 2).max(1);
        let jitter = rand::rng().random_range(0..=jitter_ceiling);

        exponential + Duration::from_millis(jitter)
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, HttpError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HttpError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Err(HttpError::NetworkUnreachable(message)) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(attempt, ?delay, err.msg = %message, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl From<&Retry> for RetryPolicy {
    fn from(value: &Retry) -> Self {
        Self {
            max_retries: value.max_retries,
            base_delay: Duration::from_millis(value.base_delay_ms),
        }
    }
}
