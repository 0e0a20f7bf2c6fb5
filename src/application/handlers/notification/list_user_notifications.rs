//! ListUserNotificationsHandler - Query handler for a user's notification history.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

/// Query for every notification addressed to a user.
#[derive(Debug, Clone, Copy)]
pub struct ListUserNotificationsQuery {
    pub user_id: UserId,
}

/// Returns notifications newest first.
pub struct ListUserNotificationsHandler {
    repository: Arc<dyn NotificationRepository>,
}

impl ListUserNotificationsHandler {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: ListUserNotificationsQuery,
    ) -> Result<Vec<Notification>, DomainError> {
        self.repository.list_for_user(query.user_id).await
    }
}
