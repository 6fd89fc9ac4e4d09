//! In-process key-value store
//!
//! Ordered by key, with the same paging rules as the DynamoDB adapter:
//! `limit` bounds the items evaluated before the filter is applied, and a
//! continuation key is returned while unevaluated items remain.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::debug;

use super::{Item, KeyValueStore, ScanOutput, ScanRequest, StoreError, StoreResult, TableKey};

pub struct MemoryStore {
    table: String,
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn table(&self) -> &str {
        &self.table
    }

    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanOutput> {
        let items = self.items.read();

        let lower = match &request.exclusive_start_key {
            Some(key) => Bound::Excluded(key.id.clone()),
            None => Bound::Unbounded,
        };
        let limit = request.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        let mut remaining = items.range((lower, Bound::Unbounded)).peekable();
        let mut page = Vec::new();
        let mut last_key = None;
        let mut evaluated = 0;

        while evaluated < limit {
            let Some((key, item)) = remaining.next() else { break };
            evaluated += 1;
            last_key = Some(key.clone());

            if request.filter.as_ref().map_or(true, |f| f.matches(item)) {
                page.push(item.clone());
            }
        }

        let last_evaluated_key = if remaining.peek().is_some() {
            last_key.map(TableKey::new)
        } else {
            None
        };

        debug!(table = %self.table, evaluated, returned = page.len(), "Memory scan");

        Ok(ScanOutput { items: page, last_evaluated_key })
    }

    async fn get(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        Ok(self.items.read().get(&key.id).cloned())
    }

    async fn put(&self, item: Item) -> StoreResult<()> {
        let key = TableKey::of(&item)
            .ok_or_else(|| StoreError::MalformedItem("item has no string id".to_string()))?;
        self.items.write().insert(key.id, item);
        Ok(())
    }

    async fn update(&self, key: &TableKey, changes: Item) -> StoreResult<Option<Item>> {
        let mut items = self.items.write();
        let Some(item) = items.get_mut(&key.id) else {
            return Ok(None);
        };

        for (attribute, value) in changes {
            if attribute != super::KEY_ATTRIBUTE {
                item.insert(attribute, value);
            }
        }

        Ok(Some(item.clone()))
    }

    async fn delete(&self, key: &TableKey) -> StoreResult<()> {
        self.items.write().remove(&key.id);
        Ok(())
    }
}
