//! Bounded retry with exponential backoff for transient storage faults

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use roles_config::RetryConfig;
use tracing::{debug, warn};

use super::{Item, KeyValueStore, ScanOutput, ScanRequest, StoreResult, TableKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base * 2^(retry-1), capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying storage operation"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(operation, attempts = attempt, error = %err, "Storage retries exhausted");
                    }
                    return Err(err);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

/// Decorator applying a [`RetryPolicy`] to every call of the inner store.
pub struct RetryingStore {
    inner: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl KeyValueStore for RetryingStore {
    fn table(&self) -> &str {
        self.inner.table()
    }

    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanOutput> {
        self.policy.run("scan", || self.inner.scan(request.clone())).await
    }

    async fn get(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        self.policy.run("get", || self.inner.get(key)).await
    }

    async fn put(&self, item: Item) -> StoreResult<()> {
        self.policy.run("put", || self.inner.put(item.clone())).await
    }

    async fn update(&self, key: &TableKey, changes: Item) -> StoreResult<Option<Item>> {
        self.policy.run("update", || self.inner.update(key, changes.clone())).await
    }

    async fn delete(&self, key: &TableKey) -> StoreResult<()> {
        self.policy.run("delete", || self.inner.delete(key)).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}
