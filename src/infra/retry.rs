//! Bounded retry with exponential backoff and jitter.
//!
//! Used only at the ledger-anchoring boundary: anchoring is the one operation
//! that is both infrastructure-fallible and safely retryable (the attestation
//! content is deterministic from its inputs). Retries are always bounded;
//! after exhaustion the last error is surfaced.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::error::{BrokerError, ErrorKind};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the initial one. Must be >= 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on exponential growth.
    pub max_delay: Duration,
    /// Backoff multiplier per retry.
    pub multiplier: f64,
    /// Jitter factor in [0.0, 1.0]; the delay is scaled by a random factor in
    /// [1 - jitter, 1 + jitter].
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::anchoring()
    }
}

impl RetryConfig {
    /// Policy for ledger anchoring: 3 attempts, backoff starting at 500ms.
    pub fn anchoring() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }

    /// Fast policy for tests.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn delay_for(&self, retry_index: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(retry_index as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jittered = if self.jitter > 0.0 {
            let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
            capped * factor
        } else {
            capped
        };
        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Run `operation`, retrying on infrastructure errors only. Validation,
/// authorization, not-found and state-conflict errors propagate immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, BrokerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrokerError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind() != ErrorKind::Infrastructure => return Err(err),
            Err(err) => {
                attempt += 1;
                if attempt >= config.max_attempts {
                    return Err(err);
                }
                let delay = config.delay_for(attempt - 1);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after infrastructure error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
