//! DynamoDB key-value store
//!
//! Configuration via the standard AWS SDK chain (env vars, instance profile,
//! etc.), see [`StoreFactory`](super::StoreFactory).

use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::ReturnValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use super::codec;
use super::{Item, KeyValueStore, ScanOutput, ScanRequest, StoreError, StoreResult, TableKey, KEY_ATTRIBUTE};

/// Service error codes worth retrying
const TRANSIENT_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
    "LimitExceededException",
];

pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }

    /// Whether any item follows `key` in scan order (unfiltered, one item).
    async fn has_items_after(&self, key: &TableKey) -> StoreResult<bool> {
        let output = self.client
            .scan()
            .table_name(&self.table)
            .limit(1)
            .set_exclusive_start_key(Some(codec::key_to_attributes(key)))
            .projection_expression("#pk")
            .expression_attribute_names("#pk", KEY_ATTRIBUTE)
            .send()
            .await
            .map_err(|e| classify("scan", e))?;

        Ok(!output.items().is_empty())
    }
}

/// Map an SDK failure onto the transient/permanent split.
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let transient = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => true,
        SdkError::ServiceError(ctx) => ctx
            .err()
            .code()
            .map(|code| TRANSIENT_CODES.contains(&code))
            .unwrap_or(false),
        _ => false,
    };

    let message = DisplayErrorContext(&err).to_string();
    if transient {
        StoreError::transient(operation, message)
    } else {
        StoreError::request(operation, message)
    }
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    fn table(&self) -> &str {
        &self.table
    }

    async fn scan(&self, request: ScanRequest) -> StoreResult<ScanOutput> {
        let mut scan = self.client
            .scan()
            .table_name(&self.table)
            .set_limit(request.limit.map(|l| l.min(i32::MAX as u32) as i32))
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(codec::key_to_attributes));

        if let Some(filter) = &request.filter {
            scan = scan
                .filter_expression("#f = :v")
                .expression_attribute_names("#f", &filter.attribute)
                .expression_attribute_values(":v", codec::to_attribute_value(&filter.value));
        }

        let output = scan.send().await.map_err(|e| classify("scan", e))?;

        let items = output.items
            .unwrap_or_default()
            .iter()
            .map(codec::from_attribute_map)
            .collect::<Result<Vec<_>, _>>()?;

        let mut last_evaluated_key = output.last_evaluated_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(codec::key_from_attributes)
            .transpose()?;

        // DynamoDB hands back a key whenever the limit is reached, even on
        // the final item; only keep it while unevaluated items remain.
        if request.limit.is_some() {
            if let Some(key) = &last_evaluated_key {
                if !self.has_items_after(key).await? {
                    last_evaluated_key = None;
                }
            }
        }

        debug!(table = %self.table, returned = items.len(), more = last_evaluated_key.is_some(), "DynamoDB scan");

        Ok(ScanOutput { items, last_evaluated_key })
    }

    async fn get(&self, key: &TableKey) -> StoreResult<Option<Item>> {
        let output = self.client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(codec::key_to_attributes(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| classify("get", e))?;

        output.item
            .as_ref()
            .map(codec::from_attribute_map)
            .transpose()
    }

    async fn put(&self, item: Item) -> StoreResult<()> {
        if TableKey::of(&item).is_none() {
            return Err(StoreError::MalformedItem("item has no string id".to_string()));
        }

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(codec::to_attribute_map(&item)))
            .send()
            .await
            .map_err(|e| classify("put", e))?;

        Ok(())
    }

    async fn update(&self, key: &TableKey, changes: Item) -> StoreResult<Option<Item>> {
        let changes: Vec<(String, serde_json::Value)> = changes
            .into_iter()
            .filter(|(attribute, _)| attribute != KEY_ATTRIBUTE)
            .collect();

        if changes.is_empty() {
            return self.get(key).await;
        }

        let mut assignments = Vec::with_capacity(changes.len());
        let mut update = self.client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(codec::key_to_attributes(key)))
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", KEY_ATTRIBUTE)
            .return_values(ReturnValue::AllNew);

        for (i, (attribute, value)) in changes.iter().enumerate() {
            assignments.push(format!("#a{i} = :v{i}"));
            update = update
                .expression_attribute_names(format!("#a{i}"), attribute)
                .expression_attribute_values(format!(":v{i}"), codec::to_attribute_value(value));
        }

        let result = update
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await;

        match result {
            Ok(output) => output.attributes
                .as_ref()
                .map(codec::from_attribute_map)
                .transpose(),
            Err(err) if err
                .as_service_error()
                .map(|e| e.is_conditional_check_failed_exception())
                .unwrap_or(false) => Ok(None),
            Err(err) => Err(classify("update", err)),
        }
    }

    async fn delete(&self, key: &TableKey) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(codec::key_to_attributes(key)))
            .send()
            .await
            .map_err(|e| classify("delete", e))?;

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
            .map_err(|e| classify("describe_table", e))?;
        Ok(())
    }
}

