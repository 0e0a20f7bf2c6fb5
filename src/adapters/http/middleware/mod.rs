//! HTTP middleware for axum.
//!
//! - `auth` - Authentication middleware, extractors and role guard

pub mod auth;

pub use auth::{auth_middleware, check_role, require_superadmin, AuthRejection, AuthState, RequireAuth};
