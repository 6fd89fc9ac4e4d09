//! Roles API Server
//!
//! Serves the roles REST API, health probes and the OpenAPI document.
//!
//! Configuration comes from a TOML file (see `ROLES_CONFIG`) with
//! environment overrides:
//! - `ROLES_HTTP_HOST` / `ROLES_HTTP_PORT` - Listen address (default 0.0.0.0:3000)
//! - `ROLES_STORAGE_BACKEND` - `dynamodb` or `memory`
//! - `DYNAMODB_TABLE_ROLES` - Table name (default `roles`)
//! - `AWS_REGION` / `APP_AWS_REGION` - Region (default `sa-east-1`)
//! - `DYNAMODB_ENDPOINT` - Endpoint override for local DynamoDB or LocalStack

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use roles_config::AppConfig;
use roles_platform::role::{roles_router, RoleService, RolesState, StoreRoleRepository};
use roles_platform::shared::{health_router, HealthState};
use roles_platform::storage::StoreFactory;
use roles_platform::ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    roles_common::logging::init_logging("roles-server");

    info!("Starting Roles API Server");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let factory = StoreFactory::new(config.storage.clone());
    info!(
        backend = ?factory.config().backend,
        table = %factory.config().table_name,
        "Configuration loaded"
    );
    let store = factory.store().await.context("Failed to initialize role store")?;

    let repository = Arc::new(StoreRoleRepository::new(store.clone()));
    let service = Arc::new(RoleService::new(repository));
    let roles_state = RolesState::new(service, config.service_name.clone());
    let health_state = HealthState::new(Some(store), Some(env!("CARGO_PKG_VERSION").to_string()));

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(roles_router(roles_state))
        .merge(health_router(health_state.clone()))
        .split_for_parts();

    let app = router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    health_state.set_ready();
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Roles API Server shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.http.cors_origins;
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
