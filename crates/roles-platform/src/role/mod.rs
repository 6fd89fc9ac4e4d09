//! Role Aggregate
//!
//! Role records with their repository, service and REST endpoints.

pub mod api;
pub mod dto;
pub mod entity;
pub mod repository;
pub mod service;

// Re-export main types
pub use api::{roles_router, RolesState};
pub use dto::{ActiveRolesResponse, CreateRoleDto, RoleListResponse, UpdateRoleDto};
pub use entity::{NewRole, Role, RoleChanges};
pub use repository::{PageQuery, RolePage, RoleRepository, StoreRoleRepository};
pub use service::RoleService;
