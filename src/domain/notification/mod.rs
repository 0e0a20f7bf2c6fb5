//! Notification module - durable records and live push envelopes.

mod notification;
mod push;

pub use notification::{NewNotification, Notification, SYSTEM_AUTHOR};
pub use push::PushMessage;
