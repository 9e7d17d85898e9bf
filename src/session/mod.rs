//! Session connection manager
//!
//! One manager per logged-in client. It owns up to three Socket.IO channels
//! (chat, call and stream), routes inbound events to registered handlers,
//! tracks room membership and reports connection state to observers.

mod driver;
mod manager;
mod observers;
mod registry;
mod types;

pub use manager::{EndpointConfig, SessionConnectionManager};
pub use observers::{ConnectionLostCallback, ObserverId, StatusCallback};
pub use registry::{EventHandler, SubscriptionId};
pub use types::{
    ChannelInfo, ChannelKind, ConnectionHandle, ConnectionState, RoomMembership, SessionStats,
    StatusChange, StatusSnapshot,
};
