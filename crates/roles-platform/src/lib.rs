//! Roles Platform
//!
//! CRUD API for role records:
//! - `role` - entity, repository, service and REST endpoints
//! - `storage` - key-value table adapters (DynamoDB, in-memory, retrying)
//! - `shared` - error taxonomy, health probes and query helpers

pub mod role;
pub mod shared;
pub mod storage;

use utoipa::OpenApi;

pub use role::{roles_router, Role, RoleService, RolesState, StoreRoleRepository};
pub use shared::error::{PlatformError, Result};
pub use storage::{KeyValueStore, MemoryStore, StoreFactory};

/// OpenAPI document root; paths are merged in from the routers.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roles API",
        description = "Manage roles and their permissions"
    ),
    tags(
        (name = "roles", description = "Role management"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;
