//! Scripted in-memory transport shared by the session integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use realtime_sessions::auth::MemoryTokenStore;
use realtime_sessions::config::Settings;
use realtime_sessions::session::{ChannelKind, EndpointConfig, SessionConnectionManager};
use realtime_sessions::transport::{
    ConnectRequest, Connection, Connector, DisconnectReason, TransportError, TransportEvent,
};

/// How the next `connect` call behaves
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    Accept,
    Reject(TransportError),
    /// Never completes, so the caller's timeout fires
    Hang,
    /// Accepts once the handshake has taken this long
    Delay(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentEvent {
    pub kind: ChannelKind,
    pub event: String,
    pub payload: Value,
}

struct Remote {
    kind: ChannelKind,
    inbound: mpsc::UnboundedSender<TransportEvent>,
    closed: Arc<AtomicBool>,
}

#[derive(Default)]
struct Shared {
    connect_calls: AtomicUsize,
    closes: AtomicUsize,
    requests: Mutex<Vec<ConnectRequest>>,
    script: Mutex<VecDeque<ConnectOutcome>>,
    sent: Mutex<Vec<SentEvent>>,
    remotes: Mutex<Vec<Remote>>,
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    shared: Arc<Shared>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for upcoming connect calls; an empty script accepts
    pub fn script(&self, outcomes: impl IntoIterator<Item = ConnectOutcome>) {
        self.shared.script.lock().unwrap().extend(outcomes);
    }

    pub fn connect_calls(&self) -> usize {
        self.shared.connect_calls.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Connections of `kind` that nobody has closed yet
    pub fn open_connections(&self, kind: ChannelKind) -> usize {
        self.shared
            .remotes
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind && !r.closed.load(Ordering::SeqCst))
            .count()
    }

    pub fn sent(&self) -> Vec<SentEvent> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn sent_named(&self, kind: ChannelKind, event: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|s| s.kind == kind && s.event == event)
            .map(|s| s.payload)
            .collect()
    }

    fn push_to_latest(&self, kind: ChannelKind, event: TransportEvent) -> bool {
        let remotes = self.shared.remotes.lock().unwrap();
        remotes
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .map(|r| r.inbound.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Deliver a server event on the newest connection of `kind`
    pub fn inject(&self, kind: ChannelKind, event: &str, payload: Value) -> bool {
        self.push_to_latest(
            kind,
            TransportEvent::Message {
                event: event.to_string(),
                payload,
            },
        )
    }

    /// Surface an asynchronous transport failure on the newest connection of `kind`
    pub fn inject_error(&self, kind: ChannelKind, message: &str) -> bool {
        self.push_to_latest(kind, TransportEvent::Error(message.to_string()))
    }

    /// Simulate the newest connection of `kind` going away
    pub fn drop_connection(&self, kind: ChannelKind, reason: DisconnectReason) -> bool {
        self.push_to_latest(kind, TransportEvent::Closed(reason))
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, request: &ConnectRequest) -> Result<Box<dyn Connection>, TransportError> {
        self.shared.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.shared.requests.lock().unwrap().push(request.clone());

        let outcome = self
            .shared
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Accept);

        match outcome {
            ConnectOutcome::Accept => Ok(self.accept(request.kind)),
            ConnectOutcome::Reject(e) => Err(e),
            ConnectOutcome::Hang => {
                std::future::pending::<()>().await;
                Err(TransportError::Closed)
            }
            ConnectOutcome::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.accept(request.kind))
            }
        }
    }
}

impl FakeConnector {
    fn accept(&self, kind: ChannelKind) -> Box<dyn Connection> {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.shared.remotes.lock().unwrap().push(Remote {
            kind,
            inbound: tx,
            closed: closed.clone(),
        });
        Box::new(FakeConnection {
            kind,
            inbound: rx,
            closed,
            shared: self.shared.clone(),
        })
    }
}

struct FakeConnection {
    kind: ChannelKind,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    closed: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn send(&mut self, event: &str, payload: Value) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.shared.sent.lock().unwrap().push(SentEvent {
            kind: self.kind,
            event: event.to_string(),
            payload,
        });
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }

    async fn close(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Settings with short delays so reconnect paths finish quickly
pub fn fast_settings(reconnect_attempts: u32) -> Settings {
    let mut settings = Settings::default();
    settings.realtime.reconnect_attempts = reconnect_attempts;
    settings.realtime.reconnect_delay_ms = 10;
    settings.realtime.connect_timeout_ms = 200;
    settings.realtime.teardown_timeout_ms = 500;
    settings
}

pub fn manager_with(
    settings: &Settings,
    token: Option<&str>,
) -> (SessionConnectionManager, FakeConnector, Arc<MemoryTokenStore>) {
    let connector = FakeConnector::new();
    let tokens = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let manager = SessionConnectionManager::new(settings, tokens.clone(), Arc::new(connector.clone()));
    (manager, connector, tokens)
}

pub fn endpoint(kind: ChannelKind) -> EndpointConfig {
    EndpointConfig::new("http://realtime.test", format!("/{}", kind))
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Let spawned tasks drain queued work
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("operation did not finish in time")
}
