//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session validators (HS256 JWT, mock)
//! - `http` - Axum routes, middleware and application state
//! - `memory` - In-memory repositories
//! - `postgres` - PostgreSQL repositories and migrations
//! - `websocket` - Notification hub, connections and admission

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
