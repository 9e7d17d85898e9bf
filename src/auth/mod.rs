//! Access to the bearer token used for socket handshakes
//!
//! The session layer only reads tokens; obtaining and refreshing them is the
//! job of whatever owns the login flow.

mod token_store;

pub use token_store::{EnvTokenStore, MemoryTokenStore, TokenStore};
