//! NotifyDonationProcessedHandler - Tells a donor their donation went through.
//!
//! Two independent side effects run concurrently:
//! - a durable notification row for the history list
//! - a live `donation` push to every connection the donor has open
//!
//! Neither waits on or fails the other. The outcome reports both.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::foundation::{DomainError, Timestamp, UserId, ValidationError};
use crate::domain::notification::{NewNotification, Notification, PushMessage};
use crate::ports::{NotificationRepository, RealtimePublisher};

pub const DONATION_NOTIFICATION_TITLE: &str = "Donation Successful";

/// A donation has been processed for `user_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotifyDonationProcessedCommand {
    pub user_id: UserId,
    pub amount: f64,
}

/// What happened to each side effect.
#[derive(Debug)]
pub struct DonationNotificationOutcome {
    pub stored: Result<Notification, DomainError>,
    pub pushed: Result<(), DomainError>,
    pub completed_at: Timestamp,
}

impl DonationNotificationOutcome {
    pub fn is_complete(&self) -> bool {
        self.stored.is_ok() && self.pushed.is_ok()
    }
}

pub struct NotifyDonationProcessedHandler {
    repository: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn RealtimePublisher>,
}

impl NotifyDonationProcessedHandler {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn RealtimePublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Runs persistence and push side by side.
    ///
    /// Only an invalid amount fails the call itself; collaborator failures
    /// are logged and returned in the outcome.
    pub async fn handle(
        &self,
        cmd: NotifyDonationProcessedCommand,
    ) -> Result<DonationNotificationOutcome, DomainError> {
        if !cmd.amount.is_finite() || cmd.amount <= 0.0 {
            return Err(ValidationError::invalid_format("amount", "must be a positive number").into());
        }

        let record = NewNotification::from_system(
            cmd.user_id,
            DONATION_NOTIFICATION_TITLE,
            format!("Your donation of ${:.2} has been processed", cmd.amount),
        )?;

        let (stored, pushed) = tokio::join!(self.persist(record), self.push(cmd));

        Ok(DonationNotificationOutcome {
            stored,
            pushed,
            completed_at: Timestamp::now(),
        })
    }

    /// Fire-and-forget variant for callers of the external donation
    /// service integration that must not wait on storage or delivery.
    pub fn spawn(
        self: &Arc<Self>,
        cmd: NotifyDonationProcessedCommand,
    ) -> JoinHandle<Result<DonationNotificationOutcome, DomainError>> {
        let handler = Arc::clone(self);
        tokio::spawn(async move { handler.handle(cmd).await })
    }

    async fn persist(&self, record: NewNotification) -> Result<Notification, DomainError> {
        let user_id = record.user_id();
        let result = self.repository.create(record).await;
        if let Err(e) = &result {
            tracing::error!(user_id = %user_id, error = %e, "Failed to store donation notification");
        }
        result
    }

    async fn push(&self, cmd: NotifyDonationProcessedCommand) -> Result<(), DomainError> {
        let payload = PushMessage::donation(cmd.amount).to_payload()?;
        let result = self.publisher.notify_user(cmd.user_id, payload).await;
        if let Err(e) = &result {
            tracing::warn!(user_id = %cmd.user_id, error = %e, "Live donation push skipped");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryNotificationRepository;
    use crate::domain::foundation::ErrorCode;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<(UserId, Bytes)>>,
        pushed: Notify,
        fail: bool,
    }

    impl RecordingPublisher {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(UserId, Bytes)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RealtimePublisher for RecordingPublisher {
        async fn broadcast(&self, _payload: Bytes) -> Result<(), DomainError> {
            unreachable!("donation pushes are per-user")
        }

        async fn notify_user(&self, user_id: UserId, payload: Bytes) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::new(ErrorCode::RealtimeUnavailable, "hub stopped"));
            }
            self.sent.lock().unwrap().push((user_id, payload));
            self.pushed.notify_one();
            Ok(())
        }
    }

    /// Holds every write until released.
    #[derive(Default)]
    struct GatedRepository {
        inner: InMemoryNotificationRepository,
        gate: Notify,
    }

    #[async_trait]
    impl NotificationRepository for GatedRepository {
        async fn create(&self, notification: NewNotification) -> Result<Notification, DomainError> {
            self.gate.notified().await;
            self.inner.create(notification).await
        }

        async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, DomainError> {
            self.inner.list_for_user(user_id).await
        }
    }

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn cmd(amount: f64) -> NotifyDonationProcessedCommand {
        NotifyDonationProcessedCommand {
            user_id: user(12),
            amount,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn stores_and_pushes_donation() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = NotifyDonationProcessedHandler::new(repo.clone(), publisher.clone());

        let outcome = handler.handle(cmd(25.5)).await.unwrap();

        assert!(outcome.is_complete());
        let stored = outcome.stored.unwrap();
        assert_eq!(stored.title, "Donation Successful");
        assert_eq!(stored.message, "Your donation of $25.50 has been processed");
        assert_eq!(stored.created_by, "system");

        let sent = publisher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, user(12));
        let body: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(body["type"], "donation");
        assert_eq!(body["amount"], 25.5);
        assert_eq!(body["message"], "Thank you for your donation!");
    }

    #[tokio::test]
    async fn push_still_happens_when_storage_fails() {
        let repo = Arc::new(InMemoryNotificationRepository::failing());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = NotifyDonationProcessedHandler::new(repo, publisher.clone());

        let outcome = handler.handle(cmd(10.0)).await.unwrap();

        assert_eq!(outcome.stored.unwrap_err().code, ErrorCode::DatabaseError);
        assert!(outcome.pushed.is_ok());
        assert_eq!(publisher.sent().len(), 1);
    }

    #[tokio::test]
    async fn storage_still_happens_when_push_fails() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let handler =
            NotifyDonationProcessedHandler::new(repo.clone(), Arc::new(RecordingPublisher::failing()));

        let outcome = handler.handle(cmd(10.0)).await.unwrap();

        assert!(outcome.stored.is_ok());
        assert_eq!(outcome.pushed.unwrap_err().code, ErrorCode::RealtimeUnavailable);
        assert_eq!(repo.all().len(), 1);
    }

    #[tokio::test]
    async fn slow_storage_does_not_delay_push() {
        let repo = Arc::new(GatedRepository::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = Arc::new(NotifyDonationProcessedHandler::new(
            repo.clone(),
            publisher.clone(),
        ));

        let task = handler.spawn(cmd(5.0));
        publisher.pushed.notified().await;
        assert_eq!(publisher.sent().len(), 1);
        assert!(repo.inner.all().is_empty());

        repo.gate.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let handler = NotifyDonationProcessedHandler::new(
            Arc::new(InMemoryNotificationRepository::new()),
            Arc::new(RecordingPublisher::default()),
        );

        for amount in [0.0, -3.0, f64::NAN] {
            let err = handler.handle(cmd(amount)).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidFormat);
        }
    }
}
