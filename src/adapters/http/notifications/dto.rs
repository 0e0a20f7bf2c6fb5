//! HTTP DTOs for notification endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::websocket::HubStats;
use crate::domain::notification::Notification;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/v1/cms/broadcast`.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_by: String,
    /// ISO 8601
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.value(),
            user_id: n.user_id.value(),
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            created_by: n.created_by,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub users: usize,
}

impl HealthResponse {
    pub fn ok(stats: HubStats) -> Self {
        Self {
            status: "ok",
            connections: stats.connections,
            users: stats.users,
        }
    }
}

/// Error body shared by every JSON endpoint, same shape as the auth layer's.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{NotificationId, UserId};
    use crate::domain::notification::NewNotification;

    #[test]
    fn notification_response_flattens_ids() {
        let stored = NewNotification::from_system(UserId::new(4).unwrap(), "T", "M")
            .unwrap()
            .into_stored(NotificationId::from_i64(10));

        let json = serde_json::to_value(NotificationResponse::from(stored)).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["user_id"], 4);
        assert_eq!(json["is_read"], false);
        assert_eq!(json["created_by"], "system");
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("X", "y")).unwrap();
        assert!(json.get("details").is_none());
    }
}
