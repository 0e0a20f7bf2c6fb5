//! WebSocket admission.
//!
//! Turns an authenticated HTTP upgrade into a registered connection:
//! 1. Reject the request with 401 if no user was authenticated
//! 2. Upgrade with the configured inbound frame limit
//! 3. Register with the hub and wait for the acknowledgement
//! 4. Queue the `connected` welcome
//! 5. Run the pumps until the connection closes

use std::fmt;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{Sink, Stream, StreamExt};

use crate::adapters::http::middleware::RequireAuth;
use crate::domain::foundation::AuthenticatedUser;
use crate::domain::notification::PushMessage;

use super::connection::{CloseReason, Connection};
use super::hub::Hub;

/// Upgrade handler for the notification stream.
///
/// Route: `GET /api/v1/notifications/ws` (also mounted at `/ws`)
pub async fn ws_handler(
    RequireAuth(user): RequireAuth,
    State(hub): State<Hub>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.max_message_size(hub.config().max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, user, hub))
}

async fn handle_socket(socket: WebSocket, user: AuthenticatedUser, hub: Hub) {
    let (sink, stream) = socket.split();
    admit(sink, stream, user, hub).await;
}

/// Registers an upgraded transport with the hub and serves it until close.
pub async fn admit<S, R, E>(sink: S, stream: R, user: AuthenticatedUser, hub: Hub) -> CloseReason
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let (connection, handle) = Connection::new(user.id, user.role.clone(), hub.config());
    let conn_id = handle.id();

    if let Err(e) = hub.register(handle.clone()).await {
        tracing::warn!(
            conn_id = %conn_id,
            user_id = %user.id,
            error = %e,
            "Rejecting WebSocket connection"
        );
        // Pumps still run so the peer gets a close frame.
        handle.close(CloseReason::HubShutdown);
        return connection.run(sink, stream, &hub).await;
    }

    tracing::info!(
        conn_id = %conn_id,
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        "WebSocket connected"
    );

    match PushMessage::connected(&conn_id).to_payload() {
        Ok(payload) => {
            if let Err(e) = handle.try_enqueue(payload) {
                tracing::debug!(conn_id = %conn_id, error = %e, "Welcome message not queued");
            }
        }
        Err(e) => tracing::warn!(conn_id = %conn_id, error = %e, "Failed to encode welcome message"),
    }
    drop(handle);

    connection.run(sink, stream, &hub).await
}

/// Notification stream routes.
///
/// `/ws` is kept for clients built against the original path.
pub fn websocket_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Hub: axum::extract::FromRef<S>,
{
    Router::new()
        .route("/api/v1/notifications/ws", get(ws_handler))
        .route("/ws", get(ws_handler))
}
