//! Role Service
//!
//! Business rules over the repository: unique names, existence checks and
//! the response envelopes returned by the list endpoints.

use std::sync::Arc;

use roles_common::time;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::role::dto::{ActiveRolesResponse, CreateRoleDto, RoleListResponse, UpdateRoleDto};
use crate::role::entity::{NewRole, Role, RoleChanges};
use crate::role::repository::{parse_cursor, PageQuery, RoleRepository};
use crate::shared::error::{PlatformError, Result};

pub const MAX_PAGE_SIZE: u32 = 1000;

const ENTITY: &str = "Role";

pub struct RoleService {
    repository: Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        info!("Role service initialized");
        Self { repository }
    }

    pub async fn create(&self, dto: CreateRoleDto) -> Result<Role> {
        dto.validate()?;

        if self.repository.find_by_name(&dto.name).await?.is_some() {
            warn!(name = %dto.name, "Rejected duplicate role name");
            return Err(PlatformError::conflict(ENTITY, "name", dto.name));
        }

        let role = Role::create(NewRole {
            id: Uuid::new_v4().to_string(),
            name: dto.name,
            description: dto.description,
            permissions: dto.permissions,
            is_active: dto.is_active,
        });

        let role = self.repository.save(role).await.inspect_err(|e| {
            error!(error = %e, "Failed to create role");
        })?;
        info!(role_id = %role.id(), name = %role.name(), "Role created");
        Ok(role)
    }

    pub async fn find_all(&self, query: PageQuery) -> Result<RoleListResponse> {
        if let Some(limit) = query.limit {
            if limit == 0 || limit > MAX_PAGE_SIZE {
                return Err(PlatformError::invalid_input(format!(
                    "limit must be between 1 and {}",
                    MAX_PAGE_SIZE
                )));
            }
        }
        if let Some(cursor) = &query.cursor {
            parse_cursor(cursor)?;
        }

        let page = self.repository.find_all(query).await.inspect_err(|e| {
            error!(error = %e, "Failed to list roles");
        })?;

        Ok(RoleListResponse {
            items: page.items,
            count: page.count,
            last_evaluated_key: page.last_evaluated_key,
            timestamp: time::now_iso(),
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Role> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found(ENTITY, id))
    }

    pub async fn find_active_roles(&self) -> Result<ActiveRolesResponse> {
        let items = self.repository.find_active_roles().await.inspect_err(|e| {
            error!(error = %e, "Failed to list active roles");
        })?;

        Ok(ActiveRolesResponse {
            count: items.len(),
            items,
            timestamp: time::now_iso(),
        })
    }

    pub async fn update(&self, id: &str, dto: UpdateRoleDto) -> Result<Role> {
        dto.validate()?;
        self.apply(id, dto.into()).await
    }

    pub async fn activate(&self, id: &str) -> Result<Role> {
        self.apply(id, RoleChanges::is_active(true)).await
    }

    pub async fn deactivate(&self, id: &str) -> Result<Role> {
        self.apply(id, RoleChanges::is_active(false)).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repository.exists(id).await? {
            return Err(PlatformError::not_found(ENTITY, id));
        }

        self.repository.delete(id).await.inspect_err(|e| {
            error!(role_id = %id, error = %e, "Failed to delete role");
        })?;
        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    async fn apply(&self, id: &str, changes: RoleChanges) -> Result<Role> {
        let existing = self.find_by_id(id).await?;

        if let Some(name) = changes.name.as_deref() {
            if name != existing.name() && self.repository.find_by_name(name).await?.is_some() {
                warn!(role_id = %id, name, "Rejected rename to an existing role name");
                return Err(PlatformError::conflict(ENTITY, "name", name));
            }
        }

        let updated = existing.update(changes);
        let role = self.repository.save(updated).await.inspect_err(|e| {
            error!(role_id = %id, error = %e, "Failed to update role");
        })?;
        info!(role_id = %id, is_active = role.is_active(), "Role updated");
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::repository::StoreRoleRepository;
    use crate::storage::MemoryStore;

    fn service() -> RoleService {
        let store = Arc::new(MemoryStore::new("roles"));
        RoleService::new(Arc::new(StoreRoleRepository::new(store)))
    }

    fn create_dto(name: &str) -> CreateRoleDto {
        CreateRoleDto {
            name: name.to_string(),
            description: format!("{} role", name),
            permissions: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_duplicate_conflicts() {
        let service = service();

        let admin = service.create(create_dto("admin")).await.unwrap();
        assert!(Uuid::parse_str(admin.id()).is_ok());
        assert!(admin.permissions().is_empty());
        assert!(admin.is_active());

        let mut again = create_dto("admin");
        again.description = "different".to_string();
        again.permissions = Some(vec!["write".into()]);
        let err = service.create(again).await.unwrap_err();
        assert!(matches!(err, PlatformError::Conflict { .. }));
        assert_eq!(err.to_string(), "Role with name 'admin' already exists");

        // Names are case-sensitive
        assert!(service.create(create_dto("Admin")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_permissions() {
        let service = service();
        let mut dto = create_dto("viewer");
        dto.permissions = Some(vec!["read".into()]);
        let viewer = service.create(dto).await.unwrap();

        let update = UpdateRoleDto {
            permissions: Some(vec!["read".into(), "export".into()]),
            ..UpdateRoleDto::default()
        };
        service.update(viewer.id(), update).await.unwrap();

        let found = service.find_by_id(viewer.id()).await.unwrap();
        assert_eq!(found.permissions(), ["read", "export"]);
        assert_eq!(found.name(), "viewer");
        assert_eq!(found.created_at(), viewer.created_at());
        assert!(found.updated_at() > viewer.updated_at());
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_conflicts() {
        let service = service();
        service.create(create_dto("admin")).await.unwrap();
        let viewer = service.create(create_dto("viewer")).await.unwrap();

        let rename = UpdateRoleDto { name: Some("admin".into()), ..UpdateRoleDto::default() };
        let err = service.update(viewer.id(), rename).await.unwrap_err();
        assert!(matches!(err, PlatformError::Conflict { .. }));

        // Keeping the current name is not a conflict
        let same = UpdateRoleDto { name: Some("viewer".into()), ..UpdateRoleDto::default() };
        assert!(service.update(viewer.id(), same).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_role() {
        let err = service()
            .update("nope", UpdateRoleDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_activation_is_idempotent_but_advances_updated_at() {
        let service = service();
        let role = service.create(create_dto("ops")).await.unwrap();

        let first = service.deactivate(role.id()).await.unwrap();
        let second = service.deactivate(role.id()).await.unwrap();
        assert!(!first.is_active());
        assert!(!second.is_active());
        assert!(first.updated_at() > role.updated_at());
        assert!(second.updated_at() > first.updated_at());

        let active = service.activate(role.id()).await.unwrap();
        assert!(active.is_active());
        assert!(active.updated_at() > second.updated_at());
        assert_eq!(active.id(), role.id());
        assert_eq!(active.created_at(), role.created_at());
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let service = service();
        let role = service.create(create_dto("temp")).await.unwrap();

        service.delete(role.id()).await.unwrap();
        assert!(matches!(
            service.find_by_id(role.id()).await,
            Err(PlatformError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(role.id()).await,
            Err(PlatformError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_active_roles_subset() {
        let service = service();
        service.create(create_dto("a")).await.unwrap();
        let b = service.create(create_dto("b")).await.unwrap();
        service.create(create_dto("c")).await.unwrap();
        service.deactivate(b.id()).await.unwrap();

        let active = service.find_active_roles().await.unwrap();
        assert_eq!(active.count, 2);
        assert!(active.items.iter().all(|r| r.is_active() && r.id() != b.id()));
    }

    #[tokio::test]
    async fn test_pagination() {
        let service = service();
        service.create(create_dto("admin")).await.unwrap();
        service.create(create_dto("viewer")).await.unwrap();

        let first = service
            .find_all(PageQuery { limit: Some(1), cursor: None })
            .await
            .unwrap();
        assert_eq!(first.count, 1);
        assert!(first.last_evaluated_key.is_some());

        let second = service
            .find_all(PageQuery { limit: Some(1), cursor: first.last_evaluated_key.clone() })
            .await
            .unwrap();
        assert_eq!(second.count, 1);
        assert!(second.last_evaluated_key.is_none());
        assert_ne!(first.items[0].id(), second.items[0].id());
    }

    #[tokio::test]
    async fn test_find_all_rejects_bad_input() {
        let service = service();

        for limit in [0, MAX_PAGE_SIZE + 1] {
            let err = service
                .find_all(PageQuery { limit: Some(limit), cursor: None })
                .await
                .unwrap_err();
            assert!(matches!(err, PlatformError::InvalidInput { .. }));
        }

        let err = service
            .find_all(PageQuery { limit: None, cursor: Some("not-a-cursor".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_invalid_dto_is_rejected_before_storage() {
        let service = service();
        let err = service.create(create_dto(" ")).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput { .. }));
        assert!(service.find_all(PageQuery::default()).await.unwrap().items.is_empty());
    }
}
