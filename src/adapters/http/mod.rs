//! HTTP adapters - REST and WebSocket entry points.

pub mod middleware;
pub mod notifications;
mod router;
mod state;

pub use router::{build_cors_layer, build_router};
pub use state::AppState;
