//! In-memory adapters.

mod notification_repository;

pub use notification_repository::InMemoryNotificationRepository;
