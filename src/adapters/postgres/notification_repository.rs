//! PostgreSQL implementation of NotificationRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, NotificationId, Timestamp, UserId};
use crate::domain::notification::{NewNotification, Notification};
use crate::ports::NotificationRepository;

/// PostgreSQL implementation of the NotificationRepository port.
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    user_id: i64,
    title: String,
    message: String,
    is_read: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId::from_i64(row.id),
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_by: row.created_by,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (user_id, title, message, is_read, created_by, created_at)
            VALUES ($1, $2, $3, FALSE, $4, $5)
            RETURNING id
            "#,
        )
        .bind(notification.user_id().value())
        .bind(notification.title())
        .bind(notification.message())
        .bind(notification.created_by())
        .bind(notification.created_at().as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to save notification: {}", e),
            )
        })?;

        Ok(notification.into_stored(NotificationId::from_i64(id)))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Notification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, title, message, is_read, created_by, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to list notifications: {}", e),
            )
        })?;

        rows.into_iter().map(Notification::try_from).collect()
    }
}
