use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mplay_common::{Error, ObjectRef, Result};
use mplay_stream::ChunkStore;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

/// Exponential back-off settings for [`RetryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retrying.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// How long to wait after `error` on `attempt`.
    ///
    /// A store that names its own back-off (rate limiting) is obeyed as is.
    fn delay_after(&self, error: &Error, attempt: u32) -> Duration {
        match error {
            Error::RateLimited { retry_after } => *retry_after,
            _ => self.delay_for_attempt(attempt),
        }
    }
}

/// Retry decorator for chunk stores.
///
/// Only transient errors ([`Error::is_retryable`]) are retried; a missing
/// object or a short read fails straight through.
pub struct RetryStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ChunkStore> RetryStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: ChunkStore> ChunkStore for RetryStore<S> {
    async fn fetch_chunks(
        &self,
        object: &ObjectRef,
        chunk_index: u64,
        chunk_count: u64,
    ) -> Result<Bytes> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch_chunks(object, chunk_index, chunk_count).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) if error.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.delay_after(&error, attempt);
                    tracing::warn!(
                        object = %object,
                        chunk_index,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying chunk fetch"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn chunk_size(&self) -> Option<u64> {
        self.inner.chunk_size()
    }
}
