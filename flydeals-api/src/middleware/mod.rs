pub mod auth;
pub mod readiness;

pub use auth::{require_admin, AdminSession, SESSION_COOKIE};
pub use readiness::require_storage;
