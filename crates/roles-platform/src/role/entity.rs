//! Role Entity
//!
//! A role is an immutable value: every mutation builds a new `Role` and
//! leaves the previous one untouched.

use chrono::{DateTime, Duration, Utc};
use roles_common::time::{self, iso_millis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::storage::{Item, StoreError, StoreResult};

/// Role record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// UUID v4 assigned at creation
    id: String,

    /// Unique role name
    name: String,

    #[serde(default)]
    description: String,

    /// Permission strings, in insertion order
    #[serde(default)]
    permissions: Vec<String>,

    /// Records written without the flag read back as inactive
    #[serde(default)]
    is_active: bool,

    #[serde(with = "iso_millis")]
    #[schema(value_type = String, example = "2024-01-01T00:00:00.000Z")]
    created_at: DateTime<Utc>,

    #[serde(with = "iso_millis")]
    #[schema(value_type = String, example = "2024-01-01T00:00:00.000Z")]
    updated_at: DateTime<Utc>,
}

/// Fields of a role about to be created
#[derive(Debug, Clone)]
pub struct NewRole {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Partial change set; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl RoleChanges {
    pub fn is_active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }
}

impl Role {
    pub fn create(fields: NewRole) -> Self {
        let now = time::now_millis();
        Self {
            id: fields.id,
            name: fields.name,
            description: fields.description,
            permissions: fields.permissions.unwrap_or_default(),
            is_active: fields.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `changes` and return the updated role.
    ///
    /// `updated_at` always moves forward, by at least one millisecond,
    /// even when two updates land in the same millisecond or the clock
    /// steps back.
    pub fn update(&self, changes: RoleChanges) -> Self {
        Self {
            id: self.id.clone(),
            name: changes.name.unwrap_or_else(|| self.name.clone()),
            description: changes.description.unwrap_or_else(|| self.description.clone()),
            permissions: changes.permissions.unwrap_or_else(|| self.permissions.clone()),
            is_active: changes.is_active.unwrap_or(self.is_active),
            created_at: self.created_at,
            updated_at: time::now_millis().max(self.updated_at + Duration::milliseconds(1)),
        }
    }

    pub fn activate(&self) -> Self {
        self.update(RoleChanges::is_active(true))
    }

    pub fn deactivate(&self) -> Self {
        self.update(RoleChanges::is_active(false))
    }

    /// Storage representation
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert("id".to_string(), Value::String(self.id.clone()));
        item.insert("name".to_string(), Value::String(self.name.clone()));
        item.insert("description".to_string(), Value::String(self.description.clone()));
        item.insert(
            "permissions".to_string(),
            Value::Array(self.permissions.iter().cloned().map(Value::String).collect()),
        );
        item.insert("isActive".to_string(), Value::Bool(self.is_active));
        item.insert("createdAt".to_string(), Value::String(time::format_iso(&self.created_at)));
        item.insert("updatedAt".to_string(), Value::String(time::format_iso(&self.updated_at)));
        item
    }

    pub fn from_item(item: Item) -> StoreResult<Self> {
        serde_json::from_value(Value::Object(item))
            .map_err(|e| StoreError::MalformedItem(format!("role record: {}", e)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
