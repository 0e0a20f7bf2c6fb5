//! In-memory notification store for tests and database-less runs.
//!
//! # Panics
//!
//! Methods panic if the internal lock is poisoned. Do not use in production.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, NotificationId, UserId};
use crate::domain::notification::{NewNotification, Notification};
use crate::ports::NotificationRepository;

#[derive(Default)]
struct Store {
    next_id: i64,
    rows: Vec<Notification>,
    fail_writes: bool,
}

/// Vec-backed notification repository.
#[derive(Default)]
pub struct InMemoryNotificationRepository {
    store: RwLock<Store>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `create` fail with a database error.
    pub fn failing() -> Self {
        let repo = Self::default();
        repo.set_fail_writes(true);
        repo
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.store
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .fail_writes = fail;
    }

    /// Everything stored so far, in insertion order.
    pub fn all(&self) -> Vec<Notification> {
        self.store
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .rows
            .clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, DomainError> {
        let mut store = self
            .store
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if store.fail_writes {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Failed to save notification: store unavailable",
            ));
        }

        store.next_id += 1;
        let stored = notification.into_stored(NotificationId::from_i64(store.next_id));
        store.rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, DomainError> {
        let store = self
            .store
            .read()
            .unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Notification> = store
            .rows
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .as_datetime()
                .cmp(a.created_at.as_datetime())
                .then_with(|| b.id.value().cmp(&a.id.value()))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let repo = InMemoryNotificationRepository::new();

        let first = repo
            .create(NewNotification::from_system(user(1), "A", "a").unwrap())
            .await
            .unwrap();
        let second = repo
            .create(NewNotification::from_system(user(1), "B", "b").unwrap())
            .await
            .unwrap();

        assert!(second.id.value() > first.id.value());
        assert!(!first.is_read);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let repo = InMemoryNotificationRepository::new();
        for title in ["old", "new"] {
            repo.create(NewNotification::from_system(user(1), title, "m").unwrap())
                .await
                .unwrap();
        }
        repo.create(NewNotification::from_system(user(2), "other", "m").unwrap())
            .await
            .unwrap();

        let titles: Vec<String> = repo
            .list_for_user(user(1))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn failing_store_rejects_writes() {
        let repo = InMemoryNotificationRepository::failing();

        let err = repo
            .create(NewNotification::from_system(user(1), "A", "a").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(repo.all().is_empty());
    }
}
