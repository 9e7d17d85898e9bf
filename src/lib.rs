// Core building blocks
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Wire layer
pub mod protocol;
pub mod transport;

// Session layer
pub mod session;

pub use error::{Result, SessionError};
pub use session::{ChannelKind, ConnectionState, SessionConnectionManager};
