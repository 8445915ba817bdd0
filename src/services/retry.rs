use std::{future::Future, time::Duration};

use crate::{config::RetrySettings, error::AppError};

/// Where a retried operation currently stands
#[derive(Debug)]
enum RetryState<T> {
    Attempting { attempt: u32 },
    Waiting { attempt: u32, delay: Duration },
    Succeeded(T),
    Exhausted(AppError),
}

/// Serial retries with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: settings.base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the 0-based `attempt` fails: base × 2^attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `operation` until it succeeds or the attempts run out
    ///
    /// The closure receives the 0-based attempt number. Nothing is carried
    /// between attempts, and no wait follows the final one.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            state = match state {
                RetryState::Attempting { attempt } => match operation(attempt).await {
                    Ok(value) => RetryState::Succeeded(value),
                    Err(e) if attempt + 1 < self.max_attempts => {
                        let delay = self.delay_after(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            retry_in_ms = delay.as_millis() as u64,
                            error = %e,
                            "Attempt failed, retrying"
                        );
                        RetryState::Waiting { attempt, delay }
                    }
                    Err(e) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            error = %e,
                            "Final attempt failed"
                        );
                        RetryState::Exhausted(e)
                    }
                },
                RetryState::Waiting { attempt, delay } => {
                    tokio::time::sleep(delay).await;
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded(value) => return Ok(value),
                RetryState::Exhausted(e) => return Err(e),
            };
        }
    }
}
