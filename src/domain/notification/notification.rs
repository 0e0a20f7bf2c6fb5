//! Durable notification records.
//!
//! A `Notification` is what the list endpoint returns; it is written by the
//! persistence collaborator independently of whether the live push reached
//! any connected client.

use serde::Serialize;

use crate::domain::foundation::{NotificationId, Timestamp, UserId, ValidationError};

/// Author recorded for notifications generated by the platform itself.
pub const SYSTEM_AUTHOR: &str = "system";

/// A persisted notification, as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_by: String,
    pub created_at: Timestamp,
}

/// A notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    user_id: UserId,
    title: String,
    message: String,
    created_by: String,
    created_at: Timestamp,
}

impl NewNotification {
    /// Creates an unread notification authored by `created_by`.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let message = message.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if message.trim().is_empty() {
            return Err(ValidationError::empty_field("message"));
        }
        Ok(Self {
            user_id,
            title,
            message,
            created_by: created_by.into(),
            created_at: Timestamp::now(),
        })
    }

    /// Shorthand for platform-generated notifications.
    pub fn from_system(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(user_id, title, message, SYSTEM_AUTHOR)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Attaches the storage-assigned id, producing the stored record.
    pub fn into_stored(self, id: NotificationId) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            is_read: false,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}
