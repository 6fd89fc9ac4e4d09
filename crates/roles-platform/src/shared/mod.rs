//! Shared Module
//!
//! Errors, query helpers and health probes used across the API.

pub mod api_common;
pub mod error;
pub mod health_api;

pub use error::{ErrorResponse, PlatformError, Result};
pub use health_api::{health_router, HealthState};
