//! The notification hub.
//!
//! A single task (the [`HubRunner`]) owns the [`Registry`] and processes
//! commands one at a time from a bounded intake channel. Everything else in
//! the process talks to it through a cloneable [`Hub`] handle:
//!
//! ```text
//!  admission ──Register/Unregister──┐
//!                                   ▼
//!  publishers ──Broadcast/Notify──▶ intake (bounded) ──▶ HubRunner ──try_send──▶ connection queues
//!                                   ▲                       │
//!  /health ──────────Stats──────────┘                       └── owns Registry
//! ```
//!
//! Delivery never waits on a connection. A payload is offered to each
//! target's outbound queue with `try_send`; a full queue gets the connection
//! closed and evicted, so one slow reader cannot stall anyone else.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::HubConfig;
use crate::domain::foundation::{ConnectionId, DomainError, ErrorCode, UserId};
use crate::ports::RealtimePublisher;

use super::connection::{CloseReason, ConnectionHandle, EnqueueError};
use super::registry::Registry;

/// Errors returned by [`Hub`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("notification hub is not running")]
    Stopped,
}

/// Point-in-time registry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub connections: usize,
    pub users: usize,
}

enum Command {
    Register {
        handle: ConnectionHandle,
        ack: oneshot::Sender<()>,
    },
    Unregister(ConnectionId),
    Broadcast(Bytes),
    NotifyUser {
        user_id: UserId,
        payload: Bytes,
    },
    Stats(oneshot::Sender<HubStats>),
    UserConnections {
        user_id: UserId,
        reply: oneshot::Sender<usize>,
    },
}

/// Cloneable handle to the hub loop.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<Command>,
    shutdown: Arc<watch::Sender<bool>>,
    config: Arc<HubConfig>,
}

impl Hub {
    /// Creates the handle and the loop that serves it. Nothing runs until
    /// [`HubRunner::run`] is polled.
    pub fn new(config: HubConfig) -> (Hub, HubRunner) {
        let (commands_tx, commands_rx) = mpsc::channel(config.intake_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let hub = Hub {
            commands: commands_tx,
            shutdown: Arc::new(shutdown_tx),
            config: Arc::new(config),
        };
        let runner = HubRunner {
            commands: commands_rx,
            shutdown: shutdown_rx,
            registry: Registry::new(),
        };
        (hub, runner)
    }

    /// Creates the hub and spawns its loop on the current runtime.
    pub fn spawn(config: HubConfig) -> (Hub, JoinHandle<()>) {
        let (hub, runner) = Self::new(config);
        let task = tokio::spawn(runner.run());
        (hub, task)
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Registers a connection and waits until the loop has recorded it.
    ///
    /// Once this returns `Ok`, later broadcasts and notifications for the
    /// connection's user will target it.
    pub async fn register(&self, handle: ConnectionHandle) -> Result<(), HubError> {
        let (ack, acked) = oneshot::channel();
        self.send(Command::Register { handle, ack }).await?;
        acked.await.map_err(|_| HubError::Stopped)
    }

    /// Removes a connection. Unknown ids and a stopped hub are both fine.
    pub async fn unregister(&self, id: ConnectionId) {
        let _ = self.send(Command::Unregister(id)).await;
    }

    /// Queues a payload for every registered connection.
    pub async fn broadcast(&self, payload: Bytes) -> Result<(), HubError> {
        self.send(Command::Broadcast(payload)).await
    }

    /// Queues a payload for every connection of one user.
    pub async fn notify_user(&self, user_id: UserId, payload: Bytes) -> Result<(), HubError> {
        self.send(Command::NotifyUser { user_id, payload }).await
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Stats(reply)).await?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Number of live connections registered for a user.
    pub async fn user_connection_count(&self, user_id: UserId) -> Result<usize, HubError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::UserConnections { user_id, reply }).await?;
        response.await.map_err(|_| HubError::Stopped)
    }

    /// Stops the loop. Every registered connection is closed and later
    /// calls fail with [`HubError::Stopped`]. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow() || self.commands.is_closed()
    }

    async fn send(&self, command: Command) -> Result<(), HubError> {
        if *self.shutdown.borrow() {
            return Err(HubError::Stopped);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| HubError::Stopped)
    }
}

/// The hub loop. Owns the registry; run it exactly once.
pub struct HubRunner {
    commands: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
    registry: Registry,
}

impl HubRunner {
    pub async fn run(mut self) {
        tracing::info!("Notification hub started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
            }
        }

        self.close_all();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register { handle, ack } => {
                let id = handle.id();
                let user_id = handle.user_id();
                if self.registry.insert(handle) {
                    tracing::debug!(
                        conn_id = %id,
                        user_id = %user_id,
                        connections = self.registry.len(),
                        "Connection registered"
                    );
                }
                let _ = ack.send(());
            }
            Command::Unregister(id) => {
                if let Some(handle) = self.registry.remove(&id) {
                    tracing::debug!(
                        conn_id = %id,
                        user_id = %handle.user_id(),
                        connections = self.registry.len(),
                        "Connection unregistered"
                    );
                }
            }
            Command::Broadcast(payload) => {
                let targets = self.registry.connection_ids();
                let delivered = self.deliver(targets, &payload);
                tracing::debug!(delivered, bytes = payload.len(), "Broadcast dispatched");
            }
            Command::NotifyUser { user_id, payload } => {
                let targets = self.registry.user_connection_ids(user_id);
                if targets.is_empty() {
                    tracing::trace!(user_id = %user_id, "No live connections for user");
                    return;
                }
                let delivered = self.deliver(targets, &payload);
                tracing::debug!(user_id = %user_id, delivered, "User notification dispatched");
            }
            Command::Stats(reply) => {
                let _ = reply.send(HubStats {
                    connections: self.registry.len(),
                    users: self.registry.user_count(),
                });
            }
            Command::UserConnections { user_id, reply } => {
                let _ = reply.send(self.registry.user_connection_count(user_id));
            }
        }
    }

    /// Offers `payload` once to each target. Returns how many accepted it.
    fn deliver(&mut self, targets: Vec<ConnectionId>, payload: &Bytes) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for id in targets {
            let Some(handle) = self.registry.get(&id) else {
                continue;
            };
            match handle.try_enqueue(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(EnqueueError::Full) => {
                    tracing::warn!(
                        conn_id = %id,
                        user_id = %handle.user_id(),
                        capacity = handle.capacity(),
                        "Outbound queue full, closing slow connection"
                    );
                    handle.close(CloseReason::Overflow);
                    evicted.push(id);
                }
                Err(EnqueueError::Closed) => evicted.push(id),
            }
        }

        for id in evicted {
            self.registry.remove(&id);
        }
        delivered
    }

    fn close_all(&mut self) {
        self.commands.close();

        let handles = self.registry.drain();
        let closed = handles.len();
        for handle in handles {
            handle.close(CloseReason::HubShutdown);
        }

        // Registrations already queued must not outlive the loop either.
        while let Ok(command) = self.commands.try_recv() {
            if let Command::Register { handle, .. } = command {
                handle.close(CloseReason::HubShutdown);
            }
        }

        tracing::info!(closed, "Notification hub stopped");
    }
}

#[async_trait]
impl RealtimePublisher for Hub {
    async fn broadcast(&self, payload: Bytes) -> Result<(), DomainError> {
        Hub::broadcast(self, payload).await.map_err(unavailable)
    }

    async fn notify_user(&self, user_id: UserId, payload: Bytes) -> Result<(), DomainError> {
        Hub::notify_user(self, user_id, payload)
            .await
            .map_err(unavailable)
    }
}

fn unavailable(err: HubError) -> DomainError {
    DomainError::new(ErrorCode::RealtimeUnavailable, err.to_string())
}
