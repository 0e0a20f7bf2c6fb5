//! RealtimePublisher port - best-effort push to connected clients.
//!
//! Application handlers publish through this port so they depend on the
//! delivery contract, not on the WebSocket hub itself.
//!
//! ## Delivery semantics
//!
//! - Best effort: nothing is queued for users who are offline.
//! - `notify_user` for a user without live connections succeeds as a no-op.
//! - An error means the publisher itself is unavailable (e.g. shut down),
//!   never that a particular client failed to receive the payload.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    /// Deliver `payload` to every live connection.
    async fn broadcast(&self, payload: Bytes) -> Result<(), DomainError>;

    /// Deliver `payload` to every live connection of `user_id`.
    async fn notify_user(&self, user_id: UserId, payload: Bytes) -> Result<(), DomainError>;
}
