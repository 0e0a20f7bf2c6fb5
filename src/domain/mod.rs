//! Domain layer containing business types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, auth, errors)
//! - `notification` - Durable notification records and live push envelopes

pub mod foundation;
pub mod notification;
