//! Axum router configuration for notification endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::require_superadmin;
use crate::adapters::http::state::AppState;

use super::handlers::{broadcast_announcement, health, list_notifications};

/// Notification API routes.
///
/// # Routes
///
/// - `GET /api/v1/users/notifications` - Caller's history (authenticated)
/// - `POST /api/v1/cms/broadcast` - Announcement to everyone (superadmin)
/// - `GET /health` - Liveness with hub counts (public)
pub fn notification_routes() -> Router<AppState> {
    let cms = Router::new()
        .route("/broadcast", post(broadcast_announcement))
        .route_layer(middleware::from_fn(require_superadmin));

    Router::new()
        .route("/api/v1/users/notifications", get(list_notifications))
        .nest("/api/v1/cms", cms)
        .route("/health", get(health))
}
