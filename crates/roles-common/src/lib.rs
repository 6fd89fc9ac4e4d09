//! Roles API shared utilities.

pub mod logging;
pub mod time;
