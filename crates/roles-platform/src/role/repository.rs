//! Role Repository

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::role::entity::Role;
use crate::shared::error::{PlatformError, Result};
use crate::storage::{Filter, Item, KeyValueStore, ScanRequest, TableKey};

/// Page request for [`RoleRepository::find_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: Option<u32>,
    /// Cursor returned as `last_evaluated_key` by a previous page
    pub cursor: Option<String>,
}

/// One page of roles
#[derive(Debug, Clone)]
pub struct RolePage {
    pub items: Vec<Role>,
    pub count: usize,
    pub last_evaluated_key: Option<String>,
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_all(&self, query: PageQuery) -> Result<RolePage>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Role>>;

    /// Exact, case-sensitive match on the name
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>>;

    async fn find_active_roles(&self) -> Result<Vec<Role>>;

    /// Upsert by id
    async fn save(&self, role: Role) -> Result<Role>;

    /// Removes the record if present
    async fn delete(&self, id: &str) -> Result<()>;

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Parse an opaque page cursor back into a table key.
pub fn parse_cursor(cursor: &str) -> Result<TableKey> {
    TableKey::from_cursor(cursor)
        .ok_or_else(|| PlatformError::invalid_input("lastEvaluatedKey is not a valid cursor"))
}

/// [`RoleRepository`] over any [`KeyValueStore`]
pub struct StoreRoleRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StoreRoleRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn to_roles(items: Vec<Item>) -> Result<Vec<Role>> {
        items
            .into_iter()
            .map(|item| Role::from_item(item).map_err(PlatformError::from))
            .collect()
    }

    /// Every item matching `filter`, following scan continuation.
    async fn scan_all(&self, filter: Filter) -> Result<Vec<Role>> {
        let mut roles = Vec::new();
        let mut start_key = None;
        loop {
            let request = ScanRequest::filtered(filter.clone()).starting_after(start_key);
            let page = self.store.scan(request).await?;
            roles.extend(Self::to_roles(page.items)?);

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => return Ok(roles),
            }
        }
    }
}

#[async_trait]
impl RoleRepository for StoreRoleRepository {
    async fn find_all(&self, query: PageQuery) -> Result<RolePage> {
        let start_key = query.cursor.as_deref().map(parse_cursor).transpose()?;

        let request = ScanRequest::new()
            .with_limit(query.limit)
            .starting_after(start_key);
        let page = self.store.scan(request).await?;

        let items = Self::to_roles(page.items)?;
        Ok(RolePage {
            count: items.len(),
            items,
            last_evaluated_key: page.last_evaluated_key.map(|key| key.to_cursor()),
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Role>> {
        match self.store.get(&TableKey::new(id)).await? {
            Some(item) => Ok(Some(Role::from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let mut start_key = None;
        let mut pages = 0u32;
        loop {
            let request = ScanRequest::filtered(Filter::eq("name", name)).starting_after(start_key);
            let page = self.store.scan(request).await?;
            pages += 1;

            if let Some(item) = page.items.into_iter().next() {
                return Ok(Some(Role::from_item(item)?));
            }

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => {
                    debug!(name, pages, "No role with this name");
                    return Ok(None);
                }
            }
        }
    }

    async fn find_active_roles(&self) -> Result<Vec<Role>> {
        self.scan_all(Filter::eq("isActive", true)).await
    }

    async fn save(&self, role: Role) -> Result<Role> {
        self.store.put(role.to_item()).await?;
        Ok(role)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&TableKey::new(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::entity::NewRole;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn repo() -> (Arc<MemoryStore>, StoreRoleRepository) {
        let store = Arc::new(MemoryStore::new("roles"));
        (store.clone(), StoreRoleRepository::new(store))
    }

    fn role(id: &str, name: &str, is_active: bool) -> Role {
        Role::create(NewRole {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            permissions: None,
            is_active: Some(is_active),
        })
    }

    #[tokio::test]
    async fn test_save_and_find_by_id() {
        let (_, repo) = repo();
        let saved = repo.save(role("r1", "admin", true)).await.unwrap();

        assert_eq!(repo.find_by_id("r1").await.unwrap(), Some(saved));
        assert_eq!(repo.find_by_id("missing").await.unwrap(), None);
        assert!(repo.exists("r1").await.unwrap());
        assert!(!repo.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_sensitive() {
        let (_, repo) = repo();
        repo.save(role("r1", "admin", true)).await.unwrap();

        assert!(repo.find_by_name("admin").await.unwrap().is_some());
        assert!(repo.find_by_name("Admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_active_roles() {
        let (_, repo) = repo();
        repo.save(role("r1", "admin", true)).await.unwrap();
        repo.save(role("r2", "viewer", false)).await.unwrap();
        repo.save(role("r3", "editor", true)).await.unwrap();

        let mut names: Vec<_> = repo
            .find_active_roles()
            .await
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, ["admin", "editor"]);
    }

    #[tokio::test]
    async fn test_find_all_pages() {
        let (_, repo) = repo();
        repo.save(role("r1", "admin", true)).await.unwrap();
        repo.save(role("r2", "viewer", true)).await.unwrap();

        let first = repo.find_all(PageQuery { limit: Some(1), cursor: None }).await.unwrap();
        assert_eq!(first.count, 1);
        let cursor = first.last_evaluated_key.clone().unwrap();
        assert_eq!(cursor, r#"{"id":"r1"}"#);

        let second = repo
            .find_all(PageQuery { limit: Some(1), cursor: Some(cursor) })
            .await
            .unwrap();
        assert_eq!(second.count, 1);
        assert_eq!(second.items[0].id(), "r2");
        assert!(second.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_bad_cursor_is_invalid_input() {
        let (_, repo) = repo();
        let err = repo
            .find_all(PageQuery { limit: None, cursor: Some("{oops".into()) })
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_unconditional() {
        let (_, repo) = repo();
        repo.save(role("r1", "admin", true)).await.unwrap();

        repo.delete("r1").await.unwrap();
        repo.delete("r1").await.unwrap();
        assert!(repo.find_by_id("r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_record_is_a_storage_fault() {
        let (store, repo) = repo();
        store
            .put(json!({ "id": "broken", "name": "x" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let err = repo.find_by_id("broken").await.unwrap_err();
        assert!(matches!(err, PlatformError::StorageUnavailable { .. }));
    }
}
