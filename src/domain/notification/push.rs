//! Envelope for payloads pushed to live WebSocket clients.
//!
//! The hub treats payloads as opaque bytes; this is the schema the
//! application layer puts inside them. Every message carries a `type` tag.

use bytes::Bytes;
use serde::Serialize;

use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, Timestamp};

/// All message types the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Sent once, right after the connection has been registered.
    Connected {
        connection_id: String,
        timestamp: String,
    },

    /// A donation by the receiving user was processed.
    Donation { amount: f64, message: String },

    /// Platform-wide announcement from an administrator.
    Announcement {
        title: String,
        message: String,
        timestamp: String,
    },
}

impl PushMessage {
    pub const DONATION_THANKS: &'static str = "Thank you for your donation!";

    pub fn connected(connection_id: &ConnectionId) -> Self {
        Self::Connected {
            connection_id: connection_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    pub fn donation(amount: f64) -> Self {
        Self::Donation {
            amount,
            message: Self::DONATION_THANKS.to_string(),
        }
    }

    pub fn announcement(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Announcement {
            title: title.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }

    /// Serializes the envelope into the bytes handed to the hub.
    pub fn to_payload(&self) -> Result<Bytes, DomainError> {
        serde_json::to_vec(self).map(Bytes::from).map_err(|e| {
            DomainError::new(
                ErrorCode::SerializationError,
                format!("Failed to encode push message: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn decode(payload: &Bytes) -> Value {
        serde_json::from_slice(payload).unwrap()
    }

    #[test]
    fn donation_message_matches_client_schema() {
        let payload = PushMessage::donation(25.5).to_payload().unwrap();
        let json = decode(&payload);

        assert_eq!(json["type"], "donation");
        assert_eq!(json["amount"], 25.5);
        assert_eq!(json["message"], "Thank you for your donation!");
    }

    #[test]
    fn connected_message_carries_connection_id() {
        let id = ConnectionId::new();
        let json = decode(&PushMessage::connected(&id).to_payload().unwrap());

        assert_eq!(json["type"], "connected");
        assert_eq!(json["connection_id"], id.to_string());
    }

    #[test]
    fn announcement_carries_title_and_message() {
        let json = decode(&PushMessage::announcement("Maintenance", "Back soon").to_payload().unwrap());

        assert_eq!(json["type"], "announcement");
        assert_eq!(json["title"], "Maintenance");
        assert_eq!(json["message"], "Back soon");
        assert!(json["timestamp"].is_string());
    }
}
