//! Key-Value Storage
//!
//! A single table keyed by an opaque string `id`, reached through the
//! [`KeyValueStore`] capability: scan (optionally filtered), get, put,
//! update and delete. Items travel as JSON attribute maps.

pub mod codec;
pub mod dynamodb;
pub mod factory;
pub mod memory;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use dynamodb::DynamoStore;
pub use factory::StoreFactory;
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryingStore};

/// Raw stored record: attribute name to value.
pub type Item = serde_json::Map<String, Value>;

/// Name of the partition key attribute.
pub const KEY_ATTRIBUTE: &str = "id";

/// Storage-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Throttling, timeouts, connection failures. Safe to retry.
    #[error("transient storage failure during {operation}: {message}")]
    Transient { operation: String, message: String },

    #[error("storage request {operation} failed: {message}")]
    Request { operation: String, message: String },

    #[error("malformed item: {0}")]
    MalformedItem(String),
}

impl StoreError {
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient { operation: operation.into(), message: message.into() }
    }

    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request { operation: operation.into(), message: message.into() }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Primary key of a stored item.
///
/// Serialized as `{"id":"..."}`, which is also the wire format of the
/// continuation cursor handed to API clients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableKey {
    pub id: String,
}

impl TableKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Key of an item, if it carries a string `id`.
    pub fn of(item: &Item) -> Option<Self> {
        item.get(KEY_ATTRIBUTE)
            .and_then(Value::as_str)
            .map(Self::new)
    }

    /// Opaque cursor string for this key.
    pub fn to_cursor(&self) -> String {
        let mut key = Item::new();
        key.insert(KEY_ATTRIBUTE.to_string(), Value::String(self.id.clone()));
        Value::Object(key).to_string()
    }

    /// Parse a cursor produced by [`to_cursor`](Self::to_cursor).
    pub fn from_cursor(cursor: &str) -> Option<Self> {
        serde_json::from_str::<Self>(cursor).ok()
    }
}

/// Equality filter applied to scanned items.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub attribute: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { attribute: attribute.into(), value: value.into() }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.attribute) == Some(&self.value)
    }
}

/// Parameters of a single scan page.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Maximum number of items evaluated (before filtering)
    pub limit: Option<u32>,
    /// Resume after this key
    pub exclusive_start_key: Option<TableKey>,
    pub filter: Option<Filter>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self { filter: Some(filter), ..Self::default() }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn starting_after(mut self, key: Option<TableKey>) -> Self {
        self.exclusive_start_key = key;
        self
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub items: Vec<Item>,
    /// Present when more items may follow
    pub last_evaluated_key: Option<TableKey>,
}

/// Capability interface over the backing table.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Table this store reads and writes
    fn table(&self) -> &str;

    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanOutput>;

    async fn get(&self, key: &TableKey) -> StoreResult<Option<Item>>;

    /// Insert or replace the item with the same key
    async fn put(&self, item: Item) -> StoreResult<()>;

    /// Set the given attributes on an existing item and return the new item,
    /// or `None` when no item has this key.
    async fn update(&self, key: &TableKey, changes: Item) -> StoreResult<Option<Item>>;

    async fn delete(&self, key: &TableKey) -> StoreResult<()>;

    /// Connectivity probe
    async fn ping(&self) -> StoreResult<()> {
        self.get(&TableKey::new("__health__")).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_format() {
        let key = TableKey::new("5b0c");
        assert_eq!(key.to_cursor(), r#"{"id":"5b0c"}"#);
        assert_eq!(TableKey::from_cursor(r#"{"id":"5b0c"}"#), Some(key));
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert_eq!(TableKey::from_cursor("not json"), None);
        assert_eq!(TableKey::from_cursor(r#"{"id":42}"#), None);
        assert_eq!(TableKey::from_cursor(r#"["id"]"#), None);
    }

    #[test]
    fn test_cursor_rejects_extra_attributes() {
        assert_eq!(TableKey::from_cursor(r#"{"id":"x","n":5}"#), None);
        assert_eq!(TableKey::from_cursor(r#"{"id":"x","name":"admin"}"#), None);
    }

    #[test]
    fn test_filter_matching() {
        let item = json!({ "id": "1", "name": "admin", "isActive": true });
        let item = item.as_object().unwrap();

        assert!(Filter::eq("name", "admin").matches(item));
        assert!(!Filter::eq("name", "Admin").matches(item));
        assert!(Filter::eq("isActive", true).matches(item));
        assert!(!Filter::eq("missing", true).matches(item));
    }

    #[test]
    fn test_error_classification() {
        assert!(StoreError::transient("scan", "throttled").is_transient());
        assert!(!StoreError::request("scan", "no such table").is_transient());
        assert!(!StoreError::MalformedItem("no id".into()).is_transient());
    }
}
