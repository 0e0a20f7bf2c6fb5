//! Share the Meal - donation platform backend.
//!
//! The interesting part of this crate is the real-time notification hub in
//! [`adapters::websocket`]: a single-owner registry of live WebSocket
//! connections that delivers server-generated events to users without
//! blocking the request paths that produce them.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
