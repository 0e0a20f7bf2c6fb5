//! BroadcastAnnouncementHandler - Pushes an announcement to every live client.
//!
//! Announcements are not persisted; clients that are offline miss them.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ValidationError};
use crate::domain::notification::PushMessage;
use crate::ports::RealtimePublisher;

#[derive(Debug, Clone)]
pub struct BroadcastAnnouncementCommand {
    pub title: String,
    pub message: String,
}

pub struct BroadcastAnnouncementHandler {
    publisher: Arc<dyn RealtimePublisher>,
}

impl BroadcastAnnouncementHandler {
    pub fn new(publisher: Arc<dyn RealtimePublisher>) -> Self {
        Self { publisher }
    }

    pub async fn handle(&self, cmd: BroadcastAnnouncementCommand) -> Result<(), DomainError> {
        let title = cmd.title.trim();
        let message = cmd.message.trim();
        if title.is_empty() {
            return Err(ValidationError::empty_field("title").into());
        }
        if message.is_empty() {
            return Err(ValidationError::empty_field("message").into());
        }

        let payload = PushMessage::announcement(title, message).to_payload()?;
        self.publisher.broadcast(payload).await?;

        tracing::info!(title = %title, "Announcement broadcast");
        Ok(())
    }
}
