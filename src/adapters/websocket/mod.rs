//! WebSocket adapters for real-time notification delivery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Publishers                                   │
//! │   NotifyDonationProcessed │ BroadcastAnnouncement (RealtimePublisher)│
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ broadcast / notify_user
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              Hub                                     │
//! │   single loop, owns the Registry (by connection id, by user id)     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ try_send into bounded queues
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Connections                                 │
//! │   user 7: conn-a, conn-b     user 9: conn-c                          │
//! │   each: outbound queue → write pump → socket, read pump ← socket    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`hub`] - The hub loop and its cloneable handle
//! - [`connection`] - Per-connection queue, lifecycle and pumps
//! - [`handler`] - Axum upgrade handler (admission)
//! - `registry` - The hub's private connection index

pub mod connection;
pub mod handler;
pub mod hub;
mod registry;

pub use connection::{CloseReason, Connection, ConnectionHandle, ConnectionState, EnqueueError, PumpSettings};
pub use handler::{admit, websocket_router, ws_handler};
pub use hub::{Hub, HubError, HubRunner, HubStats};
