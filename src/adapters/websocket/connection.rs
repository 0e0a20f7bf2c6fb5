//! One admitted WebSocket connection.
//!
//! A connection is split in two halves:
//!
//! - [`ConnectionHandle`] is what the hub's registry stores. It can enqueue a
//!   payload without blocking and can request the connection to close.
//! - [`Connection`] owns the receiving end of the outbound queue and runs the
//!   read and write pumps against the transport.
//!
//! ```text
//!   Hub loop ──try_send──▶ [ outbound queue (K) ] ──▶ write pump ──▶ sink
//!                                                       ▲
//!                         closing signal (watch) ───────┤
//!                                                       ▼
//!                                        stream ──▶ read pump (liveness only)
//! ```
//!
//! Lifecycle is `Active → Closing → Closed`. Any pump or the hub may start
//! closing; the first reason recorded wins. `Closed` is entered only after
//! both pumps have returned and the transport halves have been dropped, and
//! that is the single place the connection unregisters itself.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HubConfig;
use crate::domain::foundation::{ConnectionId, Role, StateMachine, UserId};

use super::hub::Hub;

// ════════════════════════════════════════════════════════════════════════════
// Lifecycle
// ════════════════════════════════════════════════════════════════════════════

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Active = 0,
    Closing = 1,
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Active,
            1 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (ConnectionState::Active, ConnectionState::Closing)
                | (ConnectionState::Closing, ConnectionState::Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            ConnectionState::Active => vec![ConnectionState::Closing],
            ConnectionState::Closing => vec![ConnectionState::Closed],
            ConnectionState::Closed => vec![],
        }
    }
}

/// Why a connection left the `Active` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer sent a close frame or the stream ended.
    PeerClosed,
    /// Reading from the transport failed.
    ReadError,
    /// Writing to the transport failed.
    WriteError,
    /// A single write did not complete within the write timeout.
    WriteTimeout,
    /// No frame arrived from the peer within the pong timeout.
    LivenessTimeout,
    /// Outbound queue was full when the hub tried to enqueue.
    Overflow,
    /// The hub is shutting down.
    HubShutdown,
    /// The hub dropped the connection without closing it first.
    HubUnavailable,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::ReadError => "read_error",
            CloseReason::WriteError => "write_error",
            CloseReason::WriteTimeout => "write_timeout",
            CloseReason::LivenessTimeout => "liveness_timeout",
            CloseReason::Overflow => "overflow",
            CloseReason::HubShutdown => "hub_shutdown",
            CloseReason::HubUnavailable => "hub_unavailable",
        }
    }

    /// Close frame the server sends for this reason, if any.
    ///
    /// Transport failures get none: the transport is already unusable, or
    /// the peer started the closing handshake itself.
    fn close_frame(&self) -> Option<CloseFrame<'static>> {
        let code = match self {
            CloseReason::Overflow => 1008,
            CloseReason::HubShutdown => 1001,
            CloseReason::LivenessTimeout => 1000,
            CloseReason::HubUnavailable => 1011,
            CloseReason::PeerClosed
            | CloseReason::ReadError
            | CloseReason::WriteError
            | CloseReason::WriteTimeout => return None,
        };
        Some(CloseFrame {
            code,
            reason: Cow::Borrowed(self.as_str()),
        })
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing knobs for the pumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpSettings {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    pub write_timeout: Duration,
}

impl From<&HubConfig> for PumpSettings {
    fn from(config: &HubConfig) -> Self {
        Self {
            ping_interval: config.ping_interval(),
            pong_timeout: config.pong_timeout(),
            write_timeout: config.write_timeout(),
        }
    }
}

/// State shared by both halves of a connection.
struct Shared {
    id: ConnectionId,
    user_id: UserId,
    role: Role,
    capacity: usize,
    state: AtomicU8,
    closing: watch::Sender<Option<CloseReason>>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn advance(&self, from: ConnectionState, to: ConnectionState) -> bool {
        debug_assert!(from.can_transition_to(&to));
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves `Active → Closing` and wakes both pumps. Returns false if the
    /// connection was already closing, leaving the first reason in place.
    fn begin_close(&self, reason: CloseReason) -> bool {
        if !self.advance(ConnectionState::Active, ConnectionState::Closing) {
            return false;
        }
        self.closing.send_replace(Some(reason));
        tracing::debug!(
            conn_id = %self.id,
            user_id = %self.user_id,
            reason = %reason,
            "WebSocket connection closing"
        );
        true
    }

    fn close_reason(&self) -> Option<CloseReason> {
        *self.closing.borrow()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hub-side handle
// ════════════════════════════════════════════════════════════════════════════

/// Why a payload could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("outbound queue is full")]
    Full,

    #[error("connection no longer accepts payloads")]
    Closed,
}

/// Registry entry for a connection; cheap to clone.
#[derive(Clone)]
pub struct ConnectionHandle {
    shared: Arc<Shared>,
    outbound: mpsc::Sender<Bytes>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    pub fn user_id(&self) -> UserId {
        self.shared.user_id
    }

    pub fn role(&self) -> &Role {
        &self.shared.role
    }

    /// Capacity K of the outbound queue.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == ConnectionState::Active
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.shared.close_reason()
    }

    /// Queues a payload without waiting.
    pub fn try_enqueue(&self, payload: Bytes) -> Result<(), EnqueueError> {
        if !self.is_active() {
            return Err(EnqueueError::Closed);
        }
        self.outbound.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Asks the connection to close. Never blocks.
    pub fn close(&self, reason: CloseReason) -> bool {
        self.shared.begin_close(reason)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.shared.id)
            .field("user_id", &self.shared.user_id)
            .field("state", &self.state())
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Connection (pump side)
// ════════════════════════════════════════════════════════════════════════════

/// The pump side of an admitted connection.
pub struct Connection {
    shared: Arc<Shared>,
    outbound: mpsc::Receiver<Bytes>,
    closing: watch::Receiver<Option<CloseReason>>,
    settings: PumpSettings,
}

impl Connection {
    /// Creates a connection sized and timed from the hub configuration.
    pub fn new(user_id: UserId, role: Role, config: &HubConfig) -> (Connection, ConnectionHandle) {
        Self::with_settings(
            user_id,
            role,
            config.outbound_queue_capacity,
            PumpSettings::from(config),
        )
    }

    /// Creates a connection with an explicit queue capacity and pump timing.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_settings(
        user_id: UserId,
        role: Role,
        capacity: usize,
        settings: PumpSettings,
    ) -> (Connection, ConnectionHandle) {
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (closing_tx, closing_rx) = watch::channel(None);

        let shared = Arc::new(Shared {
            id: ConnectionId::new(),
            user_id,
            role,
            capacity,
            state: AtomicU8::new(ConnectionState::Active as u8),
            closing: closing_tx,
        });

        let handle = ConnectionHandle {
            shared: Arc::clone(&shared),
            outbound: outbound_tx,
        };
        let connection = Connection {
            shared,
            outbound: outbound_rx,
            closing: closing_rx,
            settings,
        };
        (connection, handle)
    }

    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    /// Gives up the pumps and exposes the outbound queue directly.
    #[cfg(test)]
    pub(crate) fn into_queue(self) -> mpsc::Receiver<Bytes> {
        self.outbound
    }

    /// Runs both pumps until the connection closes, then unregisters it.
    ///
    /// Returns once the transport has been released and the hub has been
    /// told; the reason returned is the first one recorded.
    pub async fn run<S, R, E>(self, sink: S, stream: R, hub: &Hub) -> CloseReason
    where
        S: Sink<Message> + Unpin,
        S::Error: fmt::Display,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
    {
        let Connection {
            shared,
            outbound,
            closing,
            settings,
        } = self;

        tokio::join!(
            write_pump(&shared, outbound, closing.clone(), sink, settings),
            read_pump(&shared, closing, stream, settings.pong_timeout),
        );

        // Both pumps returned, so the transport halves are dropped.
        shared.begin_close(CloseReason::PeerClosed);
        shared.advance(ConnectionState::Closing, ConnectionState::Closed);
        let reason = shared.close_reason().unwrap_or(CloseReason::PeerClosed);

        hub.unregister(shared.id).await;

        tracing::info!(
            conn_id = %shared.id,
            user_id = %shared.user_id,
            reason = %reason,
            "WebSocket disconnected"
        );
        reason
    }
}

/// Drains the outbound queue onto the sink and keeps the peer pinged.
async fn write_pump<S>(
    shared: &Shared,
    mut outbound: mpsc::Receiver<Bytes>,
    mut closing: watch::Receiver<Option<CloseReason>>,
    mut sink: S,
    settings: PumpSettings,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    let mut ping = time::interval_at(
        Instant::now() + settings.ping_interval,
        settings.ping_interval,
    );
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = closing.changed() => break,

            next = outbound.recv() => {
                let Some(payload) = next else {
                    shared.begin_close(CloseReason::HubUnavailable);
                    break;
                };
                if let Err(reason) = send_frame(shared, &mut sink, to_frame(payload), settings.write_timeout).await {
                    shared.begin_close(reason);
                    break;
                }
            }

            _ = ping.tick() => {
                if let Err(reason) = send_frame(shared, &mut sink, Message::Ping(Vec::new()), settings.write_timeout).await {
                    shared.begin_close(reason);
                    break;
                }
            }
        }
    }

    if let Some(frame) = shared.close_reason().and_then(|r| r.close_frame()) {
        // Best effort; the peer may already be gone.
        let _ = time::timeout(settings.write_timeout, sink.send(Message::Close(Some(frame)))).await;
    }
    let _ = time::timeout(settings.write_timeout, sink.close()).await;
}

/// Reads frames only to notice liveness and closure.
async fn read_pump<R, E>(
    shared: &Shared,
    mut closing: watch::Receiver<Option<CloseReason>>,
    mut stream: R,
    pong_timeout: Duration,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        tokio::select! {
            biased;

            _ = closing.changed() => break,

            frame = time::timeout(pong_timeout, stream.next()) => {
                let reason = match frame {
                    Err(_) => CloseReason::LivenessTimeout,
                    Ok(None) | Ok(Some(Ok(Message::Close(_)))) => CloseReason::PeerClosed,
                    Ok(Some(Err(e))) => {
                        tracing::debug!(conn_id = %shared.id, error = %e, "WebSocket receive error");
                        CloseReason::ReadError
                    }
                    Ok(Some(Ok(Message::Pong(_)))) => {
                        tracing::trace!(conn_id = %shared.id, "Pong received");
                        continue;
                    }
                    // Inbound payloads carry no meaning here; any frame proves liveness.
                    Ok(Some(Ok(_))) => continue,
                };
                shared.begin_close(reason);
                break;
            }
        }
    }
}

async fn send_frame<S>(
    shared: &Shared,
    sink: &mut S,
    frame: Message,
    write_timeout: Duration,
) -> Result<(), CloseReason>
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    match time::timeout(write_timeout, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!(conn_id = %shared.id, error = %e, "WebSocket sink closed");
            Err(CloseReason::WriteError)
        }
        Err(_) => Err(CloseReason::WriteTimeout),
    }
}

/// UTF-8 payloads go out as text frames, anything else as binary.
fn to_frame(payload: Bytes) -> Message {
    match String::from_utf8(payload.to_vec()) {
        Ok(text) => Message::Text(text),
        Err(e) => Message::Binary(e.into_bytes()),
    }
}
