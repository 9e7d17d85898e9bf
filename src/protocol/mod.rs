//! Typed payloads for the chat, call and stream namespaces
//!
//! Every outbound payload implements [`OutboundEvent`] and every inbound one
//! [`InboundEvent`], so the channel kind and wire name travel with the type.
//! Field names are camelCase on the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::session::ChannelKind;

/// A payload the client emits
pub trait OutboundEvent: Serialize {
    const KIND: ChannelKind;
    const NAME: &'static str;
}

/// A payload the server pushes
pub trait InboundEvent: DeserializeOwned + Send + 'static {
    const KIND: ChannelKind;
    /// Wire names; older servers may use an alias for the same payload
    const NAMES: &'static [&'static str];
}

macro_rules! outbound_event {
    ($ty:ty, $kind:expr, $name:literal) => {
        impl $crate::protocol::OutboundEvent for $ty {
            const KIND: $crate::session::ChannelKind = $kind;
            const NAME: &'static str = $name;
        }
    };
}

macro_rules! inbound_event {
    ($ty:ty, $kind:expr, $($name:literal),+) => {
        impl $crate::protocol::InboundEvent for $ty {
            const KIND: $crate::session::ChannelKind = $kind;
            const NAMES: &'static [&'static str] = &[$($name),+];
        }
    };
}

pub(crate) use inbound_event;
pub(crate) use outbound_event;

pub mod call;
pub mod chat;
pub mod stream;
