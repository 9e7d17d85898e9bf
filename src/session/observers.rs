//! Status-change and connection-lost observers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{ChannelKind, ConnectionState, StatusChange};

/// Broadcast buffer for `status_changes()` streams
const STATUS_BROADCAST_CAPACITY: usize = 64;

pub type StatusCallback = Arc<dyn Fn(ChannelKind, ConnectionState) + Send + Sync>;
pub type ConnectionLostCallback = Arc<dyn Fn(ChannelKind, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ObserverId(u64);

#[derive(Clone)]
enum Observer {
    Status(StatusCallback),
    ConnectionLost(ConnectionLostCallback),
}

pub struct StatusObservers {
    observers: RwLock<Vec<(ObserverId, Observer)>>,
    next_id: AtomicU64,
    broadcast: broadcast::Sender<StatusChange>,
}

impl StatusObservers {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(STATUS_BROADCAST_CAPACITY);
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            broadcast,
        }
    }

    fn add(&self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut observers) = self.observers.write() {
            observers.push((id, observer));
        }
        id
    }

    pub fn on_status_change(&self, callback: StatusCallback) -> ObserverId {
        self.add(Observer::Status(callback))
    }

    pub fn on_connection_lost(&self, callback: ConnectionLostCallback) -> ObserverId {
        self.add(Observer::ConnectionLost(callback))
    }

    pub fn remove(&self, id: ObserverId) -> bool {
        match self.observers.write() {
            Ok(mut observers) => {
                let before = observers.len();
                observers.retain(|(entry, _)| *entry != id);
                observers.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.broadcast.subscribe()
    }

    /// Snapshot of the current observers, so callbacks run without the lock held
    fn snapshot(&self) -> Vec<Observer> {
        self.observers
            .read()
            .map(|observers| observers.iter().map(|(_, o)| o.clone()).collect())
            .unwrap_or_default()
    }

    pub fn notify_status(&self, change: StatusChange) {
        // No receivers is fine
        let _ = self.broadcast.send(change);

        for observer in self.snapshot() {
            if let Observer::Status(callback) = observer {
                callback(change.kind, change.current);
            }
        }
    }

    pub fn notify_connection_lost(&self, kind: ChannelKind, reason: &str) {
        for observer in self.snapshot() {
            if let Observer::ConnectionLost(callback) = observer {
                callback(kind, reason);
            }
        }
    }
}

impl Default for StatusObservers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn change(current: ConnectionState) -> StatusChange {
        StatusChange {
            kind: ChannelKind::Chat,
            previous: ConnectionState::Connected,
            current,
        }
    }

    #[test]
    fn test_status_observer_receives_changes() {
        let observers = StatusObservers::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        observers.on_status_change(Arc::new(move |kind, state| {
            assert_eq!(kind, ChannelKind::Chat);
            assert_eq!(state, ConnectionState::Reconnecting);
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        observers.notify_status(change(ConnectionState::Reconnecting));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_observer_is_silent() {
        let observers = StatusObservers::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let id = observers.on_connection_lost(Arc::new(move |_, _| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(observers.remove(id));

        observers.notify_connection_lost(ChannelKind::Call, "retry budget exhausted");
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_broadcast_subscribers() {
        let observers = StatusObservers::new();
        let mut rx = observers.subscribe();

        observers.notify_status(change(ConnectionState::Failed));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.current, ConnectionState::Failed);
        assert_eq!(received.previous, ConnectionState::Connected);
    }
}
