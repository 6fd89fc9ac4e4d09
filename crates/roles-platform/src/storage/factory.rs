//! Store Factory
//!
//! Builds the configured store on first use and hands out the same handle
//! afterwards, so the SDK client is created once per process.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use roles_config::{StorageBackend, StorageConfig};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{DynamoStore, KeyValueStore, MemoryStore, RetryPolicy, RetryingStore, StoreResult};

pub struct StoreFactory {
    config: StorageConfig,
    store: OnceCell<Arc<dyn KeyValueStore>>,
}

impl StoreFactory {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Whether the store has been built yet
    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    /// The shared store, building it on the first call.
    pub async fn store(&self) -> StoreResult<Arc<dyn KeyValueStore>> {
        let store = self.store
            .get_or_try_init(|| async { self.build().await })
            .await?;
        Ok(store.clone())
    }

    async fn build(&self) -> StoreResult<Arc<dyn KeyValueStore>> {
        let inner: Arc<dyn KeyValueStore> = match self.config.backend {
            StorageBackend::Memory => {
                info!(table = %self.config.table_name, "Using in-memory role store");
                Arc::new(MemoryStore::new(&self.config.table_name))
            }
            StorageBackend::Dynamodb => {
                let mut loader = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(self.config.region.clone()));
                if let Some(endpoint) = &self.config.endpoint {
                    loader = loader.endpoint_url(endpoint);
                }
                let sdk_config = loader.load().await;
                let client = aws_sdk_dynamodb::Client::new(&sdk_config);

                info!(
                    table = %self.config.table_name,
                    region = %self.config.region,
                    endpoint = ?self.config.endpoint,
                    "Initialized DynamoDB role store"
                );
                Arc::new(DynamoStore::new(client, &self.config.table_name))
            }
        };

        let store = RetryingStore::new(inner, RetryPolicy::from(&self.config.retry));
        debug!(
            max_attempts = store.policy().max_attempts,
            base_delay_ms = store.policy().base_delay.as_millis() as u64,
            "Storage retry policy"
        );
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TableKey;
    use serde_json::json;

    fn memory_config() -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        }
    }

    #[tokio::test]
    async fn test_store_is_built_once() {
        let factory = StoreFactory::new(memory_config());
        assert!(!factory.is_initialized());

        let first = factory.store().await.unwrap();
        let second = factory.store().await.unwrap();
        assert!(factory.is_initialized());
        assert!(Arc::ptr_eq(&first, &second));

        let item = json!({ "id": "r1" }).as_object().cloned().unwrap();
        first.put(item).await.unwrap();
        assert!(second.get(&TableKey::new("r1")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_factory_keeps_its_config() {
        let mut config = memory_config();
        config.retry.max_attempts = 5;
        let factory = StoreFactory::new(config);

        assert_eq!(factory.config().backend, StorageBackend::Memory);
        assert_eq!(factory.config().retry.max_attempts, 5);
    }

    #[tokio::test]
    async fn test_table_name_comes_from_config() {
        let config = StorageConfig {
            table_name: "roles-test".to_string(),
            ..memory_config()
        };
        let store = StoreFactory::new(config).store().await.unwrap();
        assert_eq!(store.table(), "roles-test");
    }
}
