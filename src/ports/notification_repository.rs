//! NotificationRepository port - durable notification records.
//!
//! This is the persistence collaborator. It is deliberately unaware of the
//! real-time hub: a stored record exists whether or not any live client
//! received the matching push.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::notification::{NewNotification, Notification};

/// Port for storing and listing user notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a new notification, returning the stored record with its id.
    async fn create(&self, notification: NewNotification) -> Result<Notification, DomainError>;

    /// List all notifications for a user, newest first.
    ///
    /// Returns an empty vec when the user has none.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, DomainError>;
}
