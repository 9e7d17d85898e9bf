//! Transport seam between the session manager and the wire
//!
//! This module provides:
//! - `Connector` / `Connection` traits (one handshake attempt, one live socket)
//! - Socket.IO text packet codec
//! - A tokio-tungstenite websocket connector
//! - The fixed-delay reconnect policy

mod packet;
mod reconnect;
mod websocket;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::session::ChannelKind;

pub use packet::{EnginePacket, PacketError, SocketPacket, SocketPacketType};
pub use reconnect::ReconnectPolicy;
pub use websocket::WebSocketConnector;

/// Errors raised by a single transport attempt or a live connection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("namespace connect rejected: {0}")]
    Rejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed")]
    Closed,
}

/// Why an established connection went away
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DisconnectReason {
    /// The server removed us from the namespace; no automatic reconnect
    ServerDisconnect,
    TransportClose,
    PingTimeout,
    TransportError(String),
}

impl DisconnectReason {
    pub fn is_reconnectable(&self) -> bool {
        !matches!(self, DisconnectReason::ServerDisconnect)
    }
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::ServerDisconnect => f.write_str("server disconnect"),
            DisconnectReason::TransportClose => f.write_str("transport close"),
            DisconnectReason::PingTimeout => f.write_str("ping timeout"),
            DisconnectReason::TransportError(e) => write!(f, "transport error: {}", e),
        }
    }
}

/// Inbound notification from a live connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message {
        event: String,
        payload: serde_json::Value,
    },
    /// Asynchronous error after the connection was established
    Error(String),
    Closed(DisconnectReason),
}

/// Everything needed for one authenticated handshake
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub kind: ChannelKind,
    pub base_url: String,
    /// Engine path on the server, normally `/socket.io`
    pub socket_path: String,
    pub namespace: String,
    pub query: Vec<(String, String)>,
    pub token: String,
}

/// Opens transport connections; performs exactly one attempt per call
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, request: &ConnectRequest) -> Result<Box<dyn Connection>, TransportError>;
}

/// A single live, authenticated connection to one namespace
#[async_trait]
pub trait Connection: Send {
    /// Send one named event immediately
    async fn send(&mut self, event: &str, payload: serde_json::Value) -> Result<(), TransportError>;

    /// Next inbound event; `None` once the connection is gone.
    ///
    /// Must be cancel-safe: the session driver polls it inside `select!`.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Close gracefully; further calls are no-ops
    async fn close(&mut self);
}
