//! Bounded retry around linker calls
//!
//! Transient failures are retried with exponential backoff up to a fixed
//! number of attempts; permanent failures and cancellation end the call
//! immediately.

use std::time::Duration;

use spotlink_core::{RetryConfig, SpotlinkError};
use tokio_util::sync::CancellationToken;

use crate::{EntityLinker, LinkerError, LinkerOutput};

/// Retry policy for linker invocations
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.multiplier.max(1.0),
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Run the linker under `policy`, stopping early when `cancel` fires
pub async fn link_with_retry(
    linker: &dyn EntityLinker,
    text: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> spotlink_core::Result<LinkerOutput> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(SpotlinkError::Cancelled);
        }
        attempt += 1;

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(SpotlinkError::Cancelled),
            result = linker.link(text) => result,
        };

        match result {
            Ok(output) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Linker call succeeded after retry");
                }
                return Ok(output);
            }
            Err(LinkerError::Permanent(message)) => {
                tracing::error!(attempt, error = %message, "Linker rejected input");
                return Err(SpotlinkError::LinkerRejected(message));
            }
            Err(LinkerError::Transient(message)) => {
                if attempt >= max_attempts {
                    tracing::error!(attempts = attempt, error = %message, "Linker retries exhausted");
                    return Err(SpotlinkError::RetriesExhausted {
                        attempts: attempt,
                        last_error: message,
                    });
                }

                let delay = policy.backoff_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %message,
                    "Linker call failed, retrying"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(SpotlinkError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
