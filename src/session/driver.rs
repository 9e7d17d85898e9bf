//! Per-channel background task
//!
//! The driver exclusively owns the channel's transport connection. It sends
//! queued outbound events, dispatches inbound events to handlers in arrival
//! order, and runs the bounded reconnect loop after an unexpected drop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::metrics::{ChannelMetrics, EventMetrics};
use crate::transport::{ConnectRequest, Connection, DisconnectReason, TransportEvent};

use super::manager::SessionCore;
use super::types::{ChannelKind, ConnectionState};

pub(crate) enum DriverCommand {
    Emit {
        event: String,
        payload: serde_json::Value,
    },
    Close,
}

enum Step {
    Command(Option<DriverCommand>),
    Transport(Option<TransportEvent>),
}

enum PumpExit {
    /// Explicit disconnect or the channel was replaced
    Closed,
    Lost(DisconnectReason),
}

enum Reconnect {
    Connected(Box<dyn Connection>),
    Closed,
    Exhausted(String),
}

pub(crate) struct ChannelDriver {
    core: Arc<SessionCore>,
    kind: ChannelKind,
    generation: u64,
    request: ConnectRequest,
    commands: mpsc::UnboundedReceiver<DriverCommand>,
}

impl ChannelDriver {
    pub(crate) fn new(
        core: Arc<SessionCore>,
        kind: ChannelKind,
        generation: u64,
        request: ConnectRequest,
        commands: mpsc::UnboundedReceiver<DriverCommand>,
    ) -> Self {
        Self {
            core,
            kind,
            generation,
            request,
            commands,
        }
    }

    pub(crate) async fn run(mut self, mut conn: Box<dyn Connection>) {
        let kind = self.kind;
        tracing::debug!(kind = %kind, generation = self.generation, "Channel driver started");

        loop {
            let reason = match self.pump(conn.as_mut()).await {
                PumpExit::Closed => {
                    conn.close().await;
                    break;
                }
                PumpExit::Lost(reason) => reason,
            };
            conn.close().await;

            tracing::warn!(kind = %kind, reason = %reason, "Channel connection lost");

            if !reason.is_reconnectable() || !self.core.policy.is_enabled() {
                self.core
                    .release_link(kind, self.generation, ConnectionState::Disconnected);
                break;
            }

            if !self
                .core
                .transition(kind, Some(self.generation), ConnectionState::Reconnecting)
            {
                break;
            }

            match self.reconnect().await {
                Reconnect::Connected(new_conn) => {
                    conn = new_conn;
                    let membership = match self.core.mark_reconnected(kind, self.generation) {
                        Some(membership) => membership,
                        None => {
                            conn.close().await;
                            break;
                        }
                    };
                    if let Some(member) = membership {
                        let event = kind.join_event();
                        if let Err(e) = conn.send(event, member.join_payload(kind)).await {
                            tracing::warn!(kind = %kind, error = %e, "Failed to rejoin room after reconnect");
                        } else {
                            tracing::info!(kind = %kind, session_id = %member.session_id, "Rejoined room after reconnect");
                        }
                    }
                }
                Reconnect::Closed => break,
                Reconnect::Exhausted(last_error) => {
                    self.core.fail_channel(kind, self.generation, &last_error);
                    break;
                }
            }
        }

        tracing::debug!(kind = %kind, generation = self.generation, "Channel driver stopped");
    }

    /// Move events both ways until the connection ends or a close is requested
    async fn pump(&mut self, conn: &mut dyn Connection) -> PumpExit {
        let kind = self.kind;

        loop {
            let step = tokio::select! {
                command = self.commands.recv() => Step::Command(command),
                event = conn.next_event() => Step::Transport(event),
            };

            match step {
                Step::Command(Some(DriverCommand::Emit { event, payload })) => {
                    if let Err(e) = conn.send(&event, payload).await {
                        ChannelMetrics::record_transport_error(kind);
                        tracing::warn!(kind = %kind, event = %event, error = %e, "Failed to send event");
                    }
                }
                Step::Command(Some(DriverCommand::Close)) | Step::Command(None) => {
                    return PumpExit::Closed;
                }
                Step::Transport(Some(TransportEvent::Message { event, payload })) => {
                    let handlers = self.core.registry.dispatch(kind, &event, &payload);
                    EventMetrics::record_received(kind, handlers);
                    tracing::trace!(kind = %kind, event = %event, handlers, "Inbound event dispatched");
                }
                Step::Transport(Some(TransportEvent::Error(e))) => {
                    ChannelMetrics::record_transport_error(kind);
                    return PumpExit::Lost(DisconnectReason::TransportError(e));
                }
                Step::Transport(Some(TransportEvent::Closed(reason))) => {
                    return PumpExit::Lost(reason);
                }
                Step::Transport(None) => {
                    return PumpExit::Lost(DisconnectReason::TransportClose);
                }
            }
        }
    }

    async fn reconnect(&mut self) -> Reconnect {
        let kind = self.kind;
        let policy = self.core.policy.clone();
        let timeout = Duration::from_millis(self.core.config.connect_timeout_ms);
        let mut last_error = String::from("no reconnect attempt made");

        for attempt in 1..=policy.max_attempts {
            let delay = policy.next_delay();
            let closed = tokio::select! {
                _ = tokio::time::sleep(delay) => false,
                _ = Self::wait_for_close(kind, &mut self.commands) => true,
            };
            if closed || !self.core.is_current(kind, self.generation) {
                return Reconnect::Closed;
            }

            ChannelMetrics::record_reconnect_attempt(kind);
            tracing::info!(
                kind = %kind,
                attempt,
                max_attempts = policy.max_attempts,
                "Reconnecting channel"
            );

            let outcome = tokio::select! {
                result = tokio::time::timeout(timeout, self.core.connector.connect(&self.request)) => Some(result),
                _ = Self::wait_for_close(kind, &mut self.commands) => None,
            };

            match outcome {
                None => return Reconnect::Closed,
                Some(Ok(Ok(conn))) => return Reconnect::Connected(conn),
                Some(Ok(Err(e))) => {
                    tracing::warn!(kind = %kind, attempt, error = %e, "Reconnect attempt failed");
                    last_error = e.to_string();
                }
                Some(Err(_)) => {
                    tracing::warn!(kind = %kind, attempt, "Reconnect attempt timed out");
                    last_error = format!("connect timed out after {} ms", timeout.as_millis());
                }
            }
        }

        Reconnect::Exhausted(last_error)
    }

    /// Resolves once a close is requested; emits queued meanwhile are dropped
    async fn wait_for_close(kind: ChannelKind, commands: &mut mpsc::UnboundedReceiver<DriverCommand>) {
        loop {
            match commands.recv().await {
                Some(DriverCommand::Emit { event, .. }) => {
                    EventMetrics::record_dropped(kind);
                    tracing::debug!(kind = %kind, event = %event, "Dropping event queued during reconnect");
                }
                Some(DriverCommand::Close) | None => return,
            }
        }
    }
}
