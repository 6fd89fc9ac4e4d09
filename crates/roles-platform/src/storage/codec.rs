//! JSON <-> DynamoDB attribute value conversion

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};

use super::{Item, StoreError, TableKey, KEY_ATTRIBUTE};

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

pub fn to_attribute_map(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), to_attribute_value(value)))
        .collect()
}

pub fn from_attribute_value(value: &AttributeValue) -> Result<Value, StoreError> {
    let converted = match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::L(values) => Value::Array(
            values.iter().map(from_attribute_value).collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(from_attribute_map(map)?),
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(values) => Value::Array(
            values.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(StoreError::MalformedItem(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    };
    Ok(converted)
}

pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Result<Item, StoreError> {
    map.iter()
        .map(|(name, value)| from_attribute_value(value).map(|v| (name.clone(), v)))
        .collect()
}

pub fn key_to_attributes(key: &TableKey) -> HashMap<String, AttributeValue> {
    HashMap::from([(KEY_ATTRIBUTE.to_string(), AttributeValue::S(key.id.clone()))])
}

pub fn key_from_attributes(map: &HashMap<String, AttributeValue>) -> Result<TableKey, StoreError> {
    match map.get(KEY_ATTRIBUTE) {
        Some(AttributeValue::S(id)) => Ok(TableKey::new(id.clone())),
        _ => Err(StoreError::MalformedItem("key has no string id".to_string())),
    }
}

fn parse_number(raw: &str) -> Result<Number, StoreError> {
    raw.parse::<Number>()
        .map_err(|e| StoreError::MalformedItem(format!("invalid number {raw:?}: {e}")))
}
