//! Bounded retry for transient host-not-found failures.
//!
//! Only DNS failures are retried. Auth errors, bad requests and rate
//! limits come back unchanged on the first attempt.

use std::future::Future;
use std::time::Duration;
use telebot_core::{config::ClientConfig, error::BotError};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first. 1 disables retrying.
    pub max_attempts: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
        }
    }

    /// Run `call`, re-invoking it while it fails with host-not-found and
    /// attempts remain. `on_retry` sees each new attempt number (2, 3, ...).
    pub async fn run<T, F, Fut, R>(&self, mut call: F, mut on_retry: R) -> Result<T, BotError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BotError>>,
        R: FnMut(u32),
    {
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Err(e) if e.is_host_not_found() && attempt < self.max_attempts => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "api host not found, retrying: {e}"
                    );
                    on_retry(attempt);
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                other => return other,
            }
        }
    }
}
