//! Roles API
//!
//! REST endpoints for role management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::role::dto::{ActiveRolesResponse, CreateRoleDto, RoleListResponse, UpdateRoleDto};
use crate::role::entity::Role;
use crate::role::repository::PageQuery;
use crate::role::service::RoleService;
use crate::shared::api_common::{deserialize_non_empty_string, deserialize_u32_opt};
use crate::shared::error::{ErrorResponse, PlatformError};

/// Roles service state
#[derive(Clone)]
pub struct RolesState {
    pub service: Arc<RoleService>,
    /// Reported by the health route
    pub service_name: String,
}

impl RolesState {
    pub fn new(service: Arc<RoleService>, service_name: impl Into<String>) -> Self {
        Self {
            service,
            service_name: service_name.into(),
        }
    }
}

/// Query parameters for the roles list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RolesQuery {
    /// Page size (1-1000)
    #[serde(default, deserialize_with = "deserialize_u32_opt")]
    pub limit: Option<u32>,

    /// Cursor from the previous page
    #[serde(default, deserialize_with = "deserialize_non_empty_string")]
    pub last_evaluated_key: Option<String>,
}

/// Liveness body of `/roles/health`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RolesHealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

/// Roles API liveness
#[utoipa::path(
    get,
    path = "/roles/health",
    tag = "roles",
    responses(
        (status = 200, description = "Service is up", body = RolesHealthResponse)
    )
)]
pub async fn roles_health(State(state): State<RolesState>) -> Json<RolesHealthResponse> {
    Json(RolesHealthResponse {
        status: "ok".to_string(),
        service: state.service_name.clone(),
        timestamp: roles_common::time::now_iso(),
    })
}

/// List roles, one page at a time
#[utoipa::path(
    get,
    path = "/roles",
    tag = "roles",
    params(RolesQuery),
    responses(
        (status = 200, description = "Page of roles", body = RoleListResponse),
        (status = 400, description = "Invalid limit or cursor", body = ErrorResponse)
    )
)]
pub async fn list_roles(
    State(state): State<RolesState>,
    Query(query): Query<RolesQuery>,
) -> Result<Json<RoleListResponse>, PlatformError> {
    let page = PageQuery {
        limit: query.limit,
        cursor: query.last_evaluated_key,
    };
    Ok(Json(state.service.find_all(page).await?))
}

/// Create a new role
#[utoipa::path(
    post,
    path = "/roles",
    tag = "roles",
    request_body = CreateRoleDto,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Duplicate role name", body = ErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<RolesState>,
    Json(dto): Json<CreateRoleDto>,
) -> Result<(StatusCode, Json<Role>), PlatformError> {
    let role = state.service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// List all active roles
#[utoipa::path(
    get,
    path = "/roles/active",
    tag = "roles",
    responses(
        (status = 200, description = "Active roles", body = ActiveRolesResponse)
    )
)]
pub async fn list_active_roles(
    State(state): State<RolesState>,
) -> Result<Json<ActiveRolesResponse>, PlatformError> {
    Ok(Json(state.service.find_active_roles().await?))
}

/// Get role by ID
#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role found", body = Role),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn get_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, PlatformError> {
    Ok(Json(state.service.find_by_id(&id).await?))
}

/// Update role
#[utoipa::path(
    patch,
    path = "/roles/{id}",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    request_body = UpdateRoleDto,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 409, description = "Duplicate role name", body = ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
    Json(dto): Json<UpdateRoleDto>,
) -> Result<Json<Role>, PlatformError> {
    Ok(Json(state.service.update(&id, dto).await?))
}

/// Delete role
#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
) -> Result<StatusCode, PlatformError> {
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Activate role
#[utoipa::path(
    patch,
    path = "/roles/{id}/activate",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role activated", body = Role),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn activate_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, PlatformError> {
    Ok(Json(state.service.activate(&id).await?))
}

/// Deactivate role
#[utoipa::path(
    patch,
    path = "/roles/{id}/deactivate",
    tag = "roles",
    params(
        ("id" = String, Path, description = "Role ID")
    ),
    responses(
        (status = 200, description = "Role deactivated", body = Role),
        (status = 404, description = "Role not found", body = ErrorResponse)
    )
)]
pub async fn deactivate_role(
    State(state): State<RolesState>,
    Path(id): Path<String>,
) -> Result<Json<Role>, PlatformError> {
    Ok(Json(state.service.deactivate(&id).await?))
}

/// Create the roles router
pub fn roles_router(state: RolesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(roles_health))
        .routes(routes!(list_roles, create_role))
        .routes(routes!(list_active_roles))
        .routes(routes!(get_role, update_role, delete_role))
        .routes(routes!(activate_role))
        .routes(routes!(deactivate_role))
        .with_state(state)
}
