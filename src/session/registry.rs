use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use smallvec::SmallVec;

use super::types::ChannelKind;

/// Callback invoked with the payload of an inbound event
pub type EventHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Token returned by `on`, used to unsubscribe without the original closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type HandlerList = SmallVec<[(SubscriptionId, EventHandler); 4]>;

/// (kind, event name) -> handlers in registration order
pub struct HandlerRegistry {
    handlers: DashMap<(ChannelKind, String), HandlerList>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a handler under a fresh id
    pub fn register(&self, kind: ChannelKind, event: &str, handler: EventHandler) -> SubscriptionId {
        let id = self.next_id();
        self.register_with_id(kind, event, id, handler);
        id
    }

    /// Register under an existing id (one id spanning several event names)
    pub fn register_with_id(
        &self,
        kind: ChannelKind,
        event: &str,
        id: SubscriptionId,
        handler: EventHandler,
    ) {
        self.handlers
            .entry((kind, event.to_string()))
            .or_default()
            .push((id, handler));

        tracing::debug!(kind = %kind, event = %event, subscription = %id, "Handler registered");
    }

    /// Remove exactly one handler; others for the same event stay in place
    pub fn unregister(&self, kind: ChannelKind, event: &str, id: SubscriptionId) -> bool {
        let key = (kind, event.to_string());
        let mut removed = false;

        if let Some(mut list) = self.handlers.get_mut(&key) {
            let before = list.len();
            list.retain(|(entry_id, _)| *entry_id != id);
            removed = list.len() != before;
            if list.is_empty() {
                drop(list);
                self.handlers.remove_if(&key, |_, l| l.is_empty());
            }
        }

        if removed {
            tracing::debug!(kind = %kind, event = %event, subscription = %id, "Handler removed");
        }
        removed
    }

    /// Drop every handler registered on `kind`, returning how many were removed
    pub fn clear_kind(&self, kind: ChannelKind) -> usize {
        let mut removed = 0;
        self.handlers.retain(|(k, _), list| {
            if *k == kind {
                removed += list.len();
                false
            } else {
                true
            }
        });
        removed
    }

    /// Handlers for an event, cloned out so the caller holds no registry lock
    pub fn handlers_for(&self, kind: ChannelKind, event: &str) -> HandlerList {
        self.handlers
            .get(&(kind, event.to_string()))
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Invoke every handler for the event in registration order
    pub fn dispatch(&self, kind: ChannelKind, event: &str, payload: &serde_json::Value) -> usize {
        let handlers = self.handlers_for(kind, event);
        for (_, handler) in handlers.iter() {
            handler(payload);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: ChannelKind) -> usize {
        self.handlers
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().len())
            .sum()
    }

    pub fn total_handlers(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
