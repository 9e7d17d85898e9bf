//! Socket.IO client connector over tokio-tungstenite (websocket transport only)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::packet::{EnginePacket, SocketPacket, SocketPacketType};
use super::{ConnectRequest, Connection, Connector, DisconnectReason, TransportError, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SharedSink = Arc<Mutex<SplitSink<WsStream, Message>>>;

/// Engine.IO protocol revision spoken by this client
const ENGINE_PROTOCOL: &str = "4";

/// Inbound events buffered between the reader task and the session driver
const INBOUND_BUFFER_SIZE: usize = 256;

/// Opens one websocket per connect request
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        install_tls_provider();
        Self
    }

    /// `<base>/<socket path>/?EIO=4&transport=websocket&<query>` with a ws scheme
    pub fn endpoint_url(request: &ConnectRequest) -> Result<Url, TransportError> {
        let mut url = Url::parse(&request.base_url)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", request.base_url, e)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unsupported scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidEndpoint(format!("cannot use scheme {}", scheme)))?;

        url.set_path(&format!("{}/", request.socket_path.trim_end_matches('/')));

        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("EIO", ENGINE_PROTOCOL);
            pairs.append_pair("transport", "websocket");
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Installs ring as the process-wide rustls provider unless one is already set
#[cfg(feature = "rustls-tls-webpki-roots")]
pub fn install_tls_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none()
        && rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
    {
        tracing::debug!("rustls provider installed concurrently");
    }
}

#[cfg(not(feature = "rustls-tls-webpki-roots"))]
pub fn install_tls_provider() {}

pub(crate) fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim();
    if trimmed.is_empty() || trimmed == "/" {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, request: &ConnectRequest) -> Result<Box<dyn Connection>, TransportError> {
        let url = Self::endpoint_url(request)?;
        let namespace = normalize_namespace(&request.namespace);

        tracing::debug!(kind = %request.kind, url = %url, namespace = %namespace, "Opening websocket");

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        let (mut sink, mut stream) = ws_stream.split();

        let handshake = loop {
            match next_engine_packet(&mut stream).await? {
                EnginePacket::Open(data) => break data,
                EnginePacket::Noop => continue,
                other => {
                    return Err(TransportError::Handshake(format!(
                        "expected open packet, got {:?}",
                        other
                    )))
                }
            }
        };

        let auth = serde_json::json!({ "token": request.token });
        let connect = SocketPacket::connect(&namespace, auth);
        send_text(&mut sink, EnginePacket::Message(connect.encode()).encode()).await?;

        loop {
            match next_engine_packet(&mut stream).await? {
                EnginePacket::Ping(data) => {
                    send_text(&mut sink, EnginePacket::Pong(data).encode()).await?;
                }
                EnginePacket::Message(body) => {
                    let packet = SocketPacket::decode(&body)
                        .map_err(|e| TransportError::Protocol(e.to_string()))?;
                    if packet.namespace != namespace {
                        continue;
                    }
                    match packet.packet_type {
                        SocketPacketType::Connect => break,
                        SocketPacketType::ConnectError => {
                            return Err(TransportError::Rejected(packet.error_message()));
                        }
                        _ => continue,
                    }
                }
                EnginePacket::Close => return Err(TransportError::Closed),
                _ => continue,
            }
        }

        let heartbeat = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
        tracing::info!(
            kind = %request.kind,
            namespace = %namespace,
            sid = %handshake.sid,
            heartbeat_ms = heartbeat.as_millis() as u64,
            "Socket namespace connected"
        );

        let sink: SharedSink = Arc::new(Mutex::new(sink));
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER_SIZE);
        let reader = tokio::spawn(read_loop(stream, sink.clone(), tx, namespace.clone(), heartbeat));

        Ok(Box::new(WebSocketConnection {
            namespace,
            sink,
            inbound: rx,
            reader: Some(reader),
            closed: false,
        }))
    }
}

async fn send_text(
    sink: &mut SplitSink<WsStream, Message>,
    frame: String,
) -> Result<(), TransportError> {
    sink.send(Message::text(frame))
        .await
        .map_err(|e| TransportError::WebSocket(e.to_string()))
}

/// Next engine packet during the handshake; websocket control frames are skipped
async fn next_engine_packet(stream: &mut SplitStream<WsStream>) -> Result<EnginePacket, TransportError> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                return EnginePacket::decode(text.as_str())
                    .map_err(|e| TransportError::Protocol(e.to_string()));
            }
            Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(TransportError::WebSocket(e.to_string())),
        }
    }
}

/// Reader task: answers pings, watches the heartbeat and forwards namespace events
async fn read_loop(
    mut stream: SplitStream<WsStream>,
    sink: SharedSink,
    tx: mpsc::Sender<TransportEvent>,
    namespace: String,
    heartbeat: Duration,
) {
    let reason = loop {
        let next = match tokio::time::timeout(heartbeat, stream.next()).await {
            Ok(next) => next,
            Err(_) => break DisconnectReason::PingTimeout,
        };

        let text = match next {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break DisconnectReason::TransportClose,
            Some(Ok(_)) => continue,
            Some(Err(e)) => break DisconnectReason::TransportError(e.to_string()),
        };

        let packet = match EnginePacket::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(error = %e, namespace = %namespace, "Dropping malformed engine packet");
                continue;
            }
        };

        match packet {
            EnginePacket::Ping(data) => {
                let pong = Message::text(EnginePacket::Pong(data).encode());
                if let Err(e) = sink.lock().await.send(pong).await {
                    break DisconnectReason::TransportError(e.to_string());
                }
            }
            EnginePacket::Message(body) => {
                let packet = match SocketPacket::decode(&body) {
                    Ok(packet) => packet,
                    Err(e) => {
                        tracing::warn!(error = %e, namespace = %namespace, "Dropping malformed socket packet");
                        continue;
                    }
                };
                if packet.namespace != namespace {
                    continue;
                }
                match packet.packet_type {
                    SocketPacketType::Event => {
                        if let Some((event, payload)) = packet.event_parts() {
                            if tx.send(TransportEvent::Message { event, payload }).await.is_err() {
                                // Connection dropped by its owner
                                return;
                            }
                        }
                    }
                    SocketPacketType::Disconnect => break DisconnectReason::ServerDisconnect,
                    SocketPacketType::ConnectError => {
                        let _ = tx.send(TransportEvent::Error(packet.error_message())).await;
                    }
                    _ => {}
                }
            }
            EnginePacket::Close => break DisconnectReason::TransportClose,
            _ => {}
        }
    };

    tracing::debug!(namespace = %namespace, reason = %reason, "Socket reader finished");
    let _ = tx.send(TransportEvent::Closed(reason)).await;
}

pub struct WebSocketConnection {
    namespace: String,
    sink: SharedSink,
    inbound: mpsc::Receiver<TransportEvent>,
    reader: Option<JoinHandle<()>>,
    closed: bool,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, event: &str, payload: serde_json::Value) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let packet = SocketPacket::event(&self.namespace, event, payload);
        let frame = Message::text(EnginePacket::Message(packet.encode()).encode());
        self.sink
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let disconnect = EnginePacket::Message(SocketPacket::disconnect(&self.namespace).encode());
        let mut sink = self.sink.lock().await;
        let _ = sink.send(Message::text(disconnect.encode())).await;
        let _ = sink.close().await;
        drop(sink);

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ChannelKind;

    fn request(base_url: &str) -> ConnectRequest {
        ConnectRequest {
            kind: ChannelKind::Chat,
            base_url: base_url.to_string(),
            socket_path: "/socket.io".to_string(),
            namespace: "/chat".to_string(),
            query: vec![("appVersion".to_string(), "2.1".to_string())],
            token: "secret".to_string(),
        }
    }

    #[test]
    fn test_endpoint_url_switches_scheme() {
        let url = WebSocketConnector::endpoint_url(&request("https://api.example.com")).unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/socket.io/");
        assert_eq!(
            url.query(),
            Some("EIO=4&transport=websocket&appVersion=2.1")
        );

        let plain = WebSocketConnector::endpoint_url(&request("http://10.0.2.2:5000")).unwrap();
        assert_eq!(plain.scheme(), "ws");
        assert_eq!(plain.port(), Some(5000));
    }

    #[test]
    fn test_endpoint_url_rejects_unknown_scheme() {
        let err = WebSocketConnector::endpoint_url(&request("ftp://example.com")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint(_)));
    }

    #[cfg(feature = "rustls-tls-webpki-roots")]
    #[test]
    fn test_connector_installs_tls_provider() {
        let _connector = WebSocketConnector::new();
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());

        // A second connector leaves the installed provider alone
        let _again = WebSocketConnector::new();
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());
    }

    #[test]
    fn test_namespace_normalization() {
        assert_eq!(normalize_namespace("chat"), "/chat");
        assert_eq!(normalize_namespace("/stream"), "/stream");
        assert_eq!(normalize_namespace(""), "/");
    }
}
