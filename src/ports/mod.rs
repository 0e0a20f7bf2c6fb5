//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `SessionValidator` - Bearer token validation (upstream authentication)
//! - `NotificationRepository` - Durable notification records
//! - `RealtimePublisher` - Best-effort live push to connected clients

mod notification_repository;
mod realtime_publisher;
mod session_validator;

pub use notification_repository::NotificationRepository;
pub use realtime_publisher::RealtimePublisher;
pub use session_validator::SessionValidator;
