//! Request bodies and response envelopes

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::role::entity::{Role, RoleChanges};
use crate::shared::error::{PlatformError, Result};

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_PERMISSION_LEN: usize = 256;

/// Create role request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleDto {
    /// Unique role name
    pub name: String,
    pub description: String,
    /// Defaults to no permissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    /// Defaults to active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Partial role update; omitted fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateRoleDto {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        if let Some(permissions) = &self.permissions {
            validate_permissions(permissions)?;
        }
        Ok(())
    }
}

impl UpdateRoleDto {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(permissions) = &self.permissions {
            validate_permissions(permissions)?;
        }
        Ok(())
    }
}

impl From<UpdateRoleDto> for RoleChanges {
    fn from(dto: UpdateRoleDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            permissions: dto.permissions,
            is_active: dto.is_active,
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PlatformError::invalid_input("name must not be blank"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(PlatformError::invalid_input(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(PlatformError::invalid_input(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

fn validate_permissions(permissions: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for permission in permissions {
        if permission.trim().is_empty() {
            return Err(PlatformError::invalid_input("permissions must not contain blank entries"));
        }
        if permission.chars().count() > MAX_PERMISSION_LEN {
            return Err(PlatformError::invalid_input(format!(
                "permission '{}' exceeds {} characters",
                permission, MAX_PERMISSION_LEN
            )));
        }
        if !seen.insert(permission.as_str()) {
            return Err(PlatformError::invalid_input(format!(
                "duplicate permission '{}'",
                permission
            )));
        }
    }
    Ok(())
}

/// Role list page
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleListResponse {
    pub items: Vec<Role>,
    pub count: usize,
    /// Cursor for the next page, absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
    pub timestamp: String,
}

/// All active roles
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRolesResponse {
    pub items: Vec<Role>,
    pub count: usize,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn create(name: &str) -> CreateRoleDto {
        CreateRoleDto {
            name: name.to_string(),
            description: "desc".to_string(),
            permissions: None,
            is_active: None,
        }
    }

    #[test]
    fn test_create_dto_from_json() {
        let dto: CreateRoleDto =
            serde_json::from_str(r#"{"name":"admin","description":"All","isActive":false}"#).unwrap();
        assert_eq!(dto.name, "admin");
        assert_eq!(dto.is_active, Some(false));
        assert_eq!(dto.permissions, None);

        assert!(serde_json::from_str::<CreateRoleDto>(r#"{"description":"no name"}"#).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_ok!(create("admin").validate());
        assert_err!(create("   ").validate());
        assert_ok!(create(&"x".repeat(MAX_NAME_LEN)).validate());
        assert_err!(create(&"x".repeat(MAX_NAME_LEN + 1)).validate());
    }

    #[test]
    fn test_description_limit() {
        let mut dto = create("admin");
        dto.description = "d".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_permission_rules() {
        let mut dto = create("admin");
        dto.permissions = Some(vec!["read".into(), "write".into()]);
        assert!(dto.validate().is_ok());

        dto.permissions = Some(vec!["read".into(), "read".into()]);
        assert!(matches!(dto.validate(), Err(PlatformError::InvalidInput { .. })));

        dto.permissions = Some(vec!["read".into(), " ".into()]);
        assert_err!(dto.validate());

        dto.permissions = Some(vec!["p".repeat(MAX_PERMISSION_LEN + 1)]);
        assert_err!(dto.validate());
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateRoleDto::default().validate().is_ok());

        let dto = UpdateRoleDto { name: Some(String::new()), ..UpdateRoleDto::default() };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_list_response_omits_missing_cursor() {
        let body = RoleListResponse {
            items: Vec::new(),
            count: 0,
            last_evaluated_key: None,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("lastEvaluatedKey").is_none());
        assert_eq!(json["count"], 0);
    }
}
