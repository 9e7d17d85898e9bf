//! Channel identity, connection state and room membership types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three independent real-time channels a client can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Chat,
    Call,
    Stream,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Chat, ChannelKind::Call, ChannelKind::Stream];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Chat => "chat",
            ChannelKind::Call => "call",
            ChannelKind::Stream => "stream",
        }
    }

    /// Event emitted to enter a room on this channel
    pub fn join_event(&self) -> &'static str {
        match self {
            ChannelKind::Chat => "join_session",
            ChannelKind::Call => "join_room",
            ChannelKind::Stream => "join_stream",
        }
    }

    /// Event emitted to leave the tracked room on this channel
    pub fn leave_event(&self) -> &'static str {
        match self {
            ChannelKind::Chat => "leave_session",
            ChannelKind::Call => "leave_room",
            ChannelKind::Stream => "leave_stream",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(ChannelKind::Chat),
            "call" => Ok(ChannelKind::Call),
            "stream" => Ok(ChannelKind::Stream),
            other => Err(format!("unknown channel kind: {}", other)),
        }
    }
}

/// Per-channel connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }

    /// Numeric encoding for the state gauge
    pub fn as_gauge(&self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting => 3,
            ConnectionState::Failed => 4,
        }
    }

    /// `Disconnected` and `Failed` only leave through an explicit connect
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The room a channel has joined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMembership {
    /// Session id (chat, call) or stream id (stream)
    pub session_id: String,
    pub participant_id: String,
    pub role: String,
    /// Display name sent on stream joins; falls back to the participant id
    pub display_name: Option<String>,
}

impl RoomMembership {
    pub fn new(
        session_id: impl Into<String>,
        participant_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: participant_id.into(),
            role: role.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn is_host(&self) -> bool {
        self.role.eq_ignore_ascii_case("host")
    }

    /// Payload of the join event for `kind`
    pub fn join_payload(&self, kind: ChannelKind) -> serde_json::Value {
        match kind {
            ChannelKind::Chat | ChannelKind::Call => serde_json::json!({
                "sessionId": self.session_id,
                "userId": self.participant_id,
                "role": self.role,
            }),
            ChannelKind::Stream => serde_json::json!({
                "streamId": self.session_id,
                "userId": self.participant_id,
                "userName": self.display_name.as_deref().unwrap_or(&self.participant_id),
                "isHost": self.is_host(),
            }),
        }
    }

    /// Payload of the leave event for `kind`
    pub fn leave_payload(&self, kind: ChannelKind) -> serde_json::Value {
        match kind {
            ChannelKind::Chat | ChannelKind::Call => serde_json::json!({
                "sessionId": self.session_id,
                "userId": self.participant_id,
            }),
            ChannelKind::Stream => serde_json::json!({
                "streamId": self.session_id,
            }),
        }
    }
}

/// Returned by a successful connect
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionHandle {
    pub kind: ChannelKind,
    pub connection_id: Uuid,
    pub connected_at: DateTime<Utc>,
}

/// Synchronous snapshot of all channel states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusSnapshot {
    pub chat: ConnectionState,
    pub call: ConnectionState,
    pub stream: ConnectionState,
}

impl StatusSnapshot {
    pub fn get(&self, kind: ChannelKind) -> ConnectionState {
        match kind {
            ChannelKind::Chat => self.chat,
            ChannelKind::Call => self.call,
            ChannelKind::Stream => self.stream,
        }
    }

    pub(crate) fn set(&mut self, kind: ChannelKind, state: ConnectionState) {
        match kind {
            ChannelKind::Chat => self.chat = state,
            ChannelKind::Call => self.call = state,
            ChannelKind::Stream => self.stream = state,
        }
    }
}

/// A state transition, as delivered to status observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub kind: ChannelKind,
    pub previous: ConnectionState,
    pub current: ConnectionState,
}

/// Per-channel bookkeeping snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub kind: ChannelKind,
    pub state: ConnectionState,
    pub connection_id: Option<Uuid>,
    pub connected_at: Option<DateTime<Utc>>,
    pub membership: Option<RoomMembership>,
    pub handler_count: usize,
}

/// Snapshot across every channel kind
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub channels: Vec<ChannelInfo>,
    pub connected_channels: usize,
    pub total_handlers: usize,
}
