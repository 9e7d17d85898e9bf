use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::auth::TokenStore;
use crate::config::{EndpointsConfig, RealtimeConfig, Settings};
use crate::error::{Result, SessionError};
use crate::metrics::{ChannelMetrics, EventMetrics};
use crate::protocol::{InboundEvent, OutboundEvent};
use crate::telemetry::attributes;
use crate::transport::{ConnectRequest, Connector, ReconnectPolicy, WebSocketConnector};

use super::driver::{ChannelDriver, DriverCommand};
use super::observers::{ObserverId, StatusObservers};
use super::registry::{EventHandler, HandlerRegistry, SubscriptionId};
use super::types::{
    ChannelInfo, ChannelKind, ConnectionHandle, ConnectionState, RoomMembership, SessionStats,
    StatusChange, StatusSnapshot,
};

/// Where to open one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub socket_path: String,
    pub namespace: String,
    /// Extra handshake query parameters
    pub query: Vec<(String, String)>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            socket_path: "/socket.io".to_string(),
            namespace: namespace.into(),
            query: Vec::new(),
        }
    }

    pub fn from_settings(endpoints: &EndpointsConfig, kind: ChannelKind) -> Self {
        Self {
            base_url: endpoints.base_url_for(kind).to_string(),
            socket_path: endpoints.socket_path.clone(),
            namespace: endpoints.namespace_path(kind),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn into_request(self, kind: ChannelKind, token: String) -> ConnectRequest {
        ConnectRequest {
            kind,
            base_url: self.base_url,
            socket_path: self.socket_path,
            namespace: self.namespace,
            query: self.query,
            token,
        }
    }
}

pub(crate) struct ChannelLink {
    connection_id: Uuid,
    connected_at: DateTime<Utc>,
    commands: mpsc::UnboundedSender<DriverCommand>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub(crate) struct ChannelSlot {
    state: ConnectionState,
    /// Bumped whenever the slot's connection is replaced or torn down
    generation: u64,
    link: Option<ChannelLink>,
    membership: Option<RoomMembership>,
}

/// State shared between the manager handle and the channel drivers
pub(crate) struct SessionCore {
    pub(crate) config: RealtimeConfig,
    pub(crate) endpoints: EndpointsConfig,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) token_store: Arc<dyn TokenStore>,
    pub(crate) registry: HandlerRegistry,
    pub(crate) observers: StatusObservers,
    slots: DashMap<ChannelKind, ChannelSlot>,
}

impl SessionCore {
    pub(crate) fn state(&self, kind: ChannelKind) -> ConnectionState {
        self.slots
            .get(&kind)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    pub(crate) fn is_current(&self, kind: ChannelKind, generation: u64) -> bool {
        self.slots
            .get(&kind)
            .map(|slot| slot.generation == generation)
            .unwrap_or(false)
    }

    /// Apply a state change if `generation` still owns the slot.
    ///
    /// Observers hear about actual changes only. Returns false when the
    /// caller's generation is stale.
    pub(crate) fn transition(
        &self,
        kind: ChannelKind,
        generation: Option<u64>,
        state: ConnectionState,
    ) -> bool {
        let change = {
            let mut slot = match self.slots.get_mut(&kind) {
                Some(slot) => slot,
                None => return false,
            };
            if let Some(generation) = generation {
                if slot.generation != generation {
                    return false;
                }
            }
            if slot.state == state {
                return true;
            }
            let previous = slot.state;
            slot.state = state;
            StatusChange {
                kind,
                previous,
                current: state,
            }
        };

        ChannelMetrics::record_state(kind, state);
        tracing::info!(
            kind = %kind,
            from = %change.previous,
            to = %change.current,
            "Channel state changed"
        );
        self.observers.notify_status(change);
        true
    }

    /// Start a fresh attempt on the slot and return its generation
    fn begin_connect(&self, kind: ChannelKind) -> u64 {
        let generation = {
            let mut slot = self.slots.entry(kind).or_default();
            slot.generation += 1;
            slot.generation
        };
        self.transition(kind, Some(generation), ConnectionState::Connecting);
        generation
    }

    /// Detach the live link and membership, invalidating its driver
    fn take_link(&self, kind: ChannelKind) -> (Option<ChannelLink>, Option<RoomMembership>, ConnectionState) {
        match self.slots.get_mut(&kind) {
            Some(mut slot) => {
                slot.generation += 1;
                (slot.link.take(), slot.membership.take(), slot.state)
            }
            None => (None, None, ConnectionState::Disconnected),
        }
    }

    fn install_link(&self, kind: ChannelKind, generation: u64, link: ChannelLink) -> bool {
        match self.slots.get_mut(&kind) {
            Some(mut slot) if slot.generation == generation => {
                slot.link = Some(link);
                true
            }
            _ => false,
        }
    }

    fn attach_task(&self, kind: ChannelKind, generation: u64, task: JoinHandle<()>) {
        if let Some(mut slot) = self.slots.get_mut(&kind) {
            if slot.generation == generation {
                if let Some(link) = slot.link.as_mut() {
                    link.task = Some(task);
                }
            }
        }
    }

    /// Mark a reconnected channel live; yields the membership to rejoin.
    /// `None` means the driver has been superseded.
    pub(crate) fn mark_reconnected(
        &self,
        kind: ChannelKind,
        generation: u64,
    ) -> Option<Option<RoomMembership>> {
        let membership = {
            let mut slot = self.slots.get_mut(&kind)?;
            if slot.generation != generation {
                return None;
            }
            if let Some(link) = slot.link.as_mut() {
                link.connected_at = Utc::now();
            }
            slot.membership.clone()
        };
        if !self.transition(kind, Some(generation), ConnectionState::Connected) {
            return None;
        }
        Some(membership)
    }

    /// Driver exit without reconnection
    pub(crate) fn release_link(&self, kind: ChannelKind, generation: u64, state: ConnectionState) {
        if !self.transition(kind, Some(generation), state) {
            return;
        }
        if let Some(mut slot) = self.slots.get_mut(&kind) {
            if slot.generation == generation {
                slot.link = None;
                slot.membership = None;
            }
        }
    }

    /// Reconnect budget exhausted
    pub(crate) fn fail_channel(&self, kind: ChannelKind, generation: u64, reason: &str) {
        if !self.transition(kind, Some(generation), ConnectionState::Failed) {
            return;
        }
        if let Some(mut slot) = self.slots.get_mut(&kind) {
            if slot.generation == generation {
                slot.link = None;
                slot.membership = None;
            }
        }
        tracing::error!(kind = %kind, reason = %reason, "Channel reconnection exhausted");
        self.observers.notify_connection_lost(kind, reason);
    }

    /// Queue an event on the live connection
    fn enqueue(&self, kind: ChannelKind, event: &str, payload: serde_json::Value) -> Result<()> {
        let slot = self.slots.get(&kind).ok_or(SessionError::ChannelNotReady {
            kind,
            state: ConnectionState::Disconnected,
        })?;
        let not_ready = SessionError::ChannelNotReady {
            kind,
            state: slot.state,
        };
        if slot.state != ConnectionState::Connected {
            return Err(not_ready);
        }
        let link = slot.link.as_ref().ok_or(not_ready)?;
        link.commands
            .send(DriverCommand::Emit {
                event: event.to_string(),
                payload,
            })
            .map_err(|_| SessionError::TransportError("channel driver stopped".to_string()))
    }

    fn channel_info(&self, kind: ChannelKind) -> ChannelInfo {
        let (state, connection_id, connected_at, membership) = self
            .slots
            .get(&kind)
            .map(|slot| {
                (
                    slot.state,
                    slot.link.as_ref().map(|l| l.connection_id),
                    slot.link.as_ref().map(|l| l.connected_at),
                    slot.membership.clone(),
                )
            })
            .unwrap_or_default();

        ChannelInfo {
            kind,
            state,
            connection_id,
            connected_at,
            membership,
            handler_count: self.registry.handler_count(kind),
        }
    }
}

/// Multiplexes the chat, call and stream channels of one client session.
///
/// Each kind holds at most one live connection. Cloning the manager yields
/// another handle to the same session.
#[derive(Clone)]
pub struct SessionConnectionManager {
    core: Arc<SessionCore>,
}

impl SessionConnectionManager {
    pub fn new(
        settings: &Settings,
        token_store: Arc<dyn TokenStore>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let slots = DashMap::new();
        for kind in ChannelKind::ALL {
            slots.insert(kind, ChannelSlot::default());
        }

        Self {
            core: Arc::new(SessionCore {
                config: settings.realtime.clone(),
                endpoints: settings.endpoints.clone(),
                policy: ReconnectPolicy::from_config(&settings.realtime),
                connector,
                token_store,
                registry: HandlerRegistry::new(),
                observers: StatusObservers::new(),
                slots,
            }),
        }
    }

    /// Manager backed by the Socket.IO WebSocket transport
    pub fn with_websocket(settings: &Settings, token_store: Arc<dyn TokenStore>) -> Self {
        Self::new(settings, token_store, Arc::new(WebSocketConnector::new()))
    }

    /// Configured endpoint for `kind`
    pub fn endpoint(&self, kind: ChannelKind) -> EndpointConfig {
        EndpointConfig::from_settings(&self.core.endpoints, kind)
    }

    /// Open (or replace) the connection for `kind`.
    ///
    /// An existing connection of the same kind is torn down first. Fails
    /// without touching the network when no token is available.
    #[tracing::instrument(name = "session.connect", skip(self, endpoint))]
    pub async fn connect(&self, kind: ChannelKind, endpoint: EndpointConfig) -> Result<ConnectionHandle> {
        let token = match self.core.token_store.get_token() {
            Some(token) => token,
            None => {
                ChannelMetrics::record_connect(kind, "no_token");
                tracing::warn!(kind = %kind, "Cannot connect without an auth token");
                return Err(SessionError::AuthTokenMissing);
            }
        };

        self.teardown(kind).await;

        let generation = self.core.begin_connect(kind);
        let request = endpoint.into_request(kind, token);
        let timeout_ms = self.core.config.connect_timeout_ms;

        tracing::debug!(
            kind = %kind,
            base_url = %request.base_url,
            namespace = %request.namespace,
            "Opening channel"
        );

        let attempt = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.core.connector.connect(&request),
        )
        .await;

        let mut conn = match attempt {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                ChannelMetrics::record_connect(kind, "error");
                tracing::warn!(kind = %kind, error = %e, "Channel connect failed");
                self.core
                    .transition(kind, Some(generation), ConnectionState::Failed);
                return Err(SessionError::ConnectError(e.to_string()));
            }
            Err(_) => {
                ChannelMetrics::record_connect(kind, "timeout");
                tracing::warn!(kind = %kind, timeout_ms, "Channel connect timed out");
                self.core
                    .transition(kind, Some(generation), ConnectionState::Failed);
                return Err(SessionError::ConnectTimeout(timeout_ms));
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle {
            kind,
            connection_id: Uuid::new_v4(),
            connected_at: Utc::now(),
        };
        let link = ChannelLink {
            connection_id: handle.connection_id,
            connected_at: handle.connected_at,
            commands: tx,
            task: None,
        };

        // A concurrent teardown may take the link before the state flips
        let live = self.core.install_link(kind, generation, link)
            && self
                .core
                .transition(kind, Some(generation), ConnectionState::Connected);
        if !live {
            conn.close().await;
            tracing::debug!(kind = %kind, "Connect superseded by a newer request");
            return Err(SessionError::ConnectError("superseded by a newer request".to_string()));
        }
        ChannelMetrics::record_connect(kind, "connected");

        let driver = ChannelDriver::new(self.core.clone(), kind, generation, request, rx);
        let task = tokio::spawn(driver.run(conn));
        self.core.attach_task(kind, generation, task);

        let span = tracing::Span::current();
        for attribute in [
            attributes::channel_kind(kind),
            attributes::channel_state(ConnectionState::Connected),
            attributes::connection_id(handle.connection_id),
        ] {
            span.set_attribute(attribute.key, attribute.value);
        }

        tracing::info!(kind = %kind, connection_id = %handle.connection_id, "Channel connected");
        Ok(handle)
    }

    /// Connect `kind` using the configured endpoint
    pub async fn connect_default(&self, kind: ChannelKind) -> Result<ConnectionHandle> {
        self.connect(kind, self.endpoint(kind)).await
    }

    /// Leave the tracked room, close the connection and wait for its driver
    async fn teardown(&self, kind: ChannelKind) -> bool {
        let (link, membership, state) = self.core.take_link(kind);
        let mut link = match link {
            Some(link) => link,
            None => return false,
        };

        if let (Some(member), ConnectionState::Connected) = (&membership, state) {
            let _ = link.commands.send(DriverCommand::Emit {
                event: kind.leave_event().to_string(),
                payload: member.leave_payload(kind),
            });
        }
        let _ = link.commands.send(DriverCommand::Close);

        if let Some(mut task) = link.task.take() {
            let limit = Duration::from_millis(self.core.config.teardown_timeout_ms);
            if tokio::time::timeout(limit, &mut task).await.is_err() {
                tracing::warn!(kind = %kind, "Channel driver did not stop in time, aborting");
                task.abort();
            }
        }

        tracing::debug!(kind = %kind, connection_id = %link.connection_id, "Channel torn down");
        true
    }

    /// Emit an event on `kind`. Returns false, sending nothing, unless the
    /// channel is connected.
    pub fn emit(&self, kind: ChannelKind, event: &str, payload: serde_json::Value) -> bool {
        match self.core.enqueue(kind, event, payload) {
            Ok(()) => {
                EventMetrics::record_emitted(kind);
                tracing::trace!(kind = %kind, event = %event, "Event queued");
                true
            }
            Err(e) => {
                EventMetrics::record_dropped(kind);
                tracing::warn!(kind = %kind, event = %event, error = %e, "Event dropped");
                false
            }
        }
    }

    /// Emit a typed outbound event on its channel
    pub fn send<E: OutboundEvent>(&self, event: &E) -> bool {
        self.try_send(event).is_ok()
    }

    /// Like `send`, but reports why nothing went out
    pub fn try_send<E: OutboundEvent>(&self, event: &E) -> Result<()> {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                EventMetrics::record_dropped(E::KIND);
                tracing::warn!(kind = %E::KIND, event = %E::NAME, error = %e, "Failed to serialize event");
                return Err(e.into());
            }
        };

        match self.core.enqueue(E::KIND, E::NAME, payload) {
            Ok(()) => {
                EventMetrics::record_emitted(E::KIND);
                tracing::trace!(kind = %E::KIND, event = %E::NAME, "Event queued");
                Ok(())
            }
            Err(e) => {
                EventMetrics::record_dropped(E::KIND);
                tracing::warn!(kind = %E::KIND, event = %E::NAME, error = %e, "Event dropped");
                Err(e)
            }
        }
    }

    /// Join a room on a connected channel and remember it for rejoin
    pub fn join_room(
        &self,
        kind: ChannelKind,
        session_id: impl Into<String>,
        participant_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Result<()> {
        self.join_room_as(kind, RoomMembership::new(session_id, participant_id, role))
    }

    pub fn join_room_as(&self, kind: ChannelKind, membership: RoomMembership) -> Result<()> {
        let payload = membership.join_payload(kind);
        if let Err(e) = self.core.enqueue(kind, kind.join_event(), payload) {
            tracing::warn!(kind = %kind, session_id = %membership.session_id, error = %e, "Cannot join room");
            return Err(e);
        }
        EventMetrics::record_emitted(kind);

        tracing::info!(
            kind = %kind,
            session_id = %membership.session_id,
            participant_id = %membership.participant_id,
            "Joined room"
        );

        if let Some(mut slot) = self.core.slots.get_mut(&kind) {
            slot.membership = Some(membership);
        }
        Ok(())
    }

    /// Leave the tracked room, if any. Returns whether a membership existed.
    pub fn leave_room(&self, kind: ChannelKind) -> bool {
        let membership = self
            .core
            .slots
            .get_mut(&kind)
            .and_then(|mut slot| slot.membership.take());

        match membership {
            Some(member) => {
                if self.core.state(kind) == ConnectionState::Connected {
                    self.emit(kind, kind.leave_event(), member.leave_payload(kind));
                }
                tracing::info!(kind = %kind, session_id = %member.session_id, "Left room");
                true
            }
            None => false,
        }
    }

    /// Register a raw handler for `event` on `kind`
    pub fn on<F>(&self, kind: ChannelKind, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(handler);
        self.core.registry.register(kind, event, handler)
    }

    pub fn off(&self, kind: ChannelKind, event: &str, id: SubscriptionId) -> bool {
        self.core.registry.unregister(kind, event, id)
    }

    /// Register a typed handler under every wire name of `E`.
    ///
    /// Payloads that do not decode as `E` are logged and skipped.
    pub fn on_event<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: InboundEvent,
        F: Fn(E) + Send + Sync + 'static,
    {
        let id = self.core.registry.next_id();
        let handler = Arc::new(handler);

        for name in E::NAMES {
            let handler = handler.clone();
            let event_name: &'static str = *name;
            let wrapped: EventHandler = Arc::new(move |payload: &serde_json::Value| {
                match serde_json::from_value::<E>(payload.clone()) {
                    Ok(event) => handler(event),
                    Err(e) => tracing::warn!(
                        kind = %E::KIND,
                        event = %event_name,
                        error = %e,
                        "Skipping inbound event with unexpected payload"
                    ),
                }
            });
            self.core.registry.register_with_id(E::KIND, name, id, wrapped);
        }
        id
    }

    pub fn off_event<E: InboundEvent>(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for name in E::NAMES {
            removed |= self.core.registry.unregister(E::KIND, name, id);
        }
        removed
    }

    /// Close `kind`, leaving its room and dropping all of its handlers
    #[tracing::instrument(name = "session.disconnect", skip(self))]
    pub async fn disconnect(&self, kind: ChannelKind) {
        let had_link = self.teardown(kind).await;
        let handlers = self.core.registry.clear_kind(kind);
        self.core
            .transition(kind, None, ConnectionState::Disconnected);

        tracing::info!(kind = %kind, had_link, handlers_removed = handlers, "Channel disconnected");
    }

    pub async fn disconnect_all(&self) {
        for kind in ChannelKind::ALL {
            self.disconnect(kind).await;
        }
    }

    pub fn get_status(&self) -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::default();
        for kind in ChannelKind::ALL {
            snapshot.set(kind, self.core.state(kind));
        }
        snapshot
    }

    pub fn state(&self, kind: ChannelKind) -> ConnectionState {
        self.core.state(kind)
    }

    pub fn is_connected(&self, kind: ChannelKind) -> bool {
        self.state(kind) == ConnectionState::Connected
    }

    pub fn membership(&self, kind: ChannelKind) -> Option<RoomMembership> {
        self.core
            .slots
            .get(&kind)
            .and_then(|slot| slot.membership.clone())
    }

    pub fn channel_info(&self, kind: ChannelKind) -> ChannelInfo {
        self.core.channel_info(kind)
    }

    pub fn stats(&self) -> SessionStats {
        let channels: Vec<ChannelInfo> = ChannelKind::ALL
            .iter()
            .map(|kind| self.core.channel_info(*kind))
            .collect();
        let connected_channels = channels
            .iter()
            .filter(|c| c.state == ConnectionState::Connected)
            .count();

        SessionStats {
            channels,
            connected_channels,
            total_handlers: self.core.registry.total_handlers(),
        }
    }

    pub fn on_status_change<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(ChannelKind, ConnectionState) + Send + Sync + 'static,
    {
        self.core.observers.on_status_change(Arc::new(callback))
    }

    /// Called once when a channel gives up reconnecting
    pub fn on_connection_lost<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(ChannelKind, &str) + Send + Sync + 'static,
    {
        self.core.observers.on_connection_lost(Arc::new(callback))
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.core.observers.remove(id)
    }

    /// Stream of state transitions; lagging receivers skip missed changes
    pub fn status_changes(&self) -> impl Stream<Item = StatusChange> + Send + 'static {
        BroadcastStream::new(self.core.observers.subscribe()).filter_map(|change| change.ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn manager_without_token() -> SessionConnectionManager {
        SessionConnectionManager::with_websocket(
            &Settings::default(),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    #[test]
    fn test_link_taken_before_going_live_is_stale() {
        let manager = manager_without_token();
        let core = &manager.core;
        let generation = core.begin_connect(ChannelKind::Chat);
        let (tx, _rx) = mpsc::unbounded_channel();
        let link = ChannelLink {
            connection_id: Uuid::new_v4(),
            connected_at: Utc::now(),
            commands: tx,
            task: None,
        };
        assert!(core.install_link(ChannelKind::Chat, generation, link));

        // Teardown between install and the state flip
        let (taken, _, _) = core.take_link(ChannelKind::Chat);
        assert!(taken.is_some());

        assert!(!core.transition(ChannelKind::Chat, Some(generation), ConnectionState::Connected));
        assert_eq!(manager.state(ChannelKind::Chat), ConnectionState::Connecting);
        assert!(manager.channel_info(ChannelKind::Chat).connection_id.is_none());
    }

    /// Tuple map keys have no JSON form
    #[derive(serde::Serialize)]
    struct UnkeyableEvent {
        scores: std::collections::HashMap<(u8, u8), u32>,
    }

    impl OutboundEvent for UnkeyableEvent {
        const KIND: ChannelKind = ChannelKind::Chat;
        const NAME: &'static str = "score_update";
    }

    #[test]
    fn test_try_send_reports_serialization_failure() {
        let manager = manager_without_token();
        let mut scores = std::collections::HashMap::new();
        scores.insert((1, 2), 3);

        let err = manager.try_send(&UnkeyableEvent { scores }).unwrap_err();
        assert!(matches!(err, SessionError::Serialization(_)));
        assert_eq!(err.code(), "SERIALIZATION_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_try_send_reports_channel_not_ready() {
        let manager = manager_without_token();
        let event = crate::protocol::chat::Typing {
            session_id: "S1".to_string(),
            user_id: "U1".to_string(),
            is_typing: true,
        };

        let err = manager.try_send(&event).unwrap_err();
        assert!(matches!(
            err,
            SessionError::ChannelNotReady {
                kind: ChannelKind::Chat,
                state: ConnectionState::Disconnected,
            }
        ));
        assert!(!manager.send(&event));
    }

    #[test]
    fn test_endpoint_from_settings() {
        let mut endpoints = EndpointsConfig::default();
        endpoints.stream.base_url = Some("https://live.example.com".to_string());

        let chat = EndpointConfig::from_settings(&endpoints, ChannelKind::Chat);
        assert_eq!(chat.base_url, "http://localhost:5000");
        assert_eq!(chat.namespace, "/chat");

        let stream = EndpointConfig::from_settings(&endpoints, ChannelKind::Stream);
        assert_eq!(stream.base_url, "https://live.example.com");
        assert_eq!(stream.socket_path, "/socket.io");
    }

    #[test]
    fn test_initial_status_is_disconnected() {
        let manager = manager_without_token();
        assert_eq!(manager.get_status(), StatusSnapshot::default());
        assert_eq!(manager.stats().connected_channels, 0);
    }

    #[test]
    fn test_emit_when_disconnected_returns_false() {
        let manager = manager_without_token();
        assert!(!manager.emit(ChannelKind::Chat, "typing", serde_json::json!({})));
    }

    #[test]
    fn test_join_requires_connection() {
        let manager = manager_without_token();
        let err = manager
            .join_room(ChannelKind::Call, "S1", "U1", "user")
            .unwrap_err();
        assert_eq!(err.code(), "CHANNEL_NOT_READY");
        assert!(manager.membership(ChannelKind::Call).is_none());
    }

    #[tokio::test]
    async fn test_connect_without_token() {
        let manager = manager_without_token();
        let err = manager.connect_default(ChannelKind::Chat).await.unwrap_err();
        assert!(matches!(err, SessionError::AuthTokenMissing));
        assert_eq!(manager.state(ChannelKind::Chat), ConnectionState::Disconnected);
    }

    #[test]
    fn test_handler_bookkeeping() {
        let manager = manager_without_token();
        let id = manager.on(ChannelKind::Chat, "new_message", |_| {});
        manager.on(ChannelKind::Chat, "new_message", |_| {});
        assert_eq!(manager.channel_info(ChannelKind::Chat).handler_count, 2);
        assert!(manager.off(ChannelKind::Chat, "new_message", id));
        assert!(!manager.off(ChannelKind::Chat, "new_message", id));
        assert_eq!(manager.stats().total_handlers, 1);
    }
}
