//! Notification HTTP endpoints.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::{broadcast_announcement, health, list_notifications, ApiError};
pub use routes::notification_routes;
