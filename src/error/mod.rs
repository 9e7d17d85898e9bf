use thiserror::Error;

use crate::session::{ChannelKind, ConnectionState};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Authentication token missing")]
    AuthTokenMissing,

    #[error("Connect timed out after {0} ms")]
    ConnectTimeout(u64),

    #[error("Connect error: {0}")]
    ConnectError(String),

    #[error("Channel {kind} is not ready (state: {state})")]
    ChannelNotReady {
        kind: ChannelKind,
        state: ConnectionState,
    },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SessionError {
    /// Stable machine-readable code, used as a metric label and log field
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::AuthTokenMissing => "AUTH_TOKEN_MISSING",
            SessionError::ConnectTimeout(_) => "CONNECT_TIMEOUT",
            SessionError::ConnectError(_) => "CONNECT_ERROR",
            SessionError::ChannelNotReady { .. } => "CHANNEL_NOT_READY",
            SessionError::TransportError(_) => "TRANSPORT_ERROR",
            SessionError::Serialization(_) => "SERIALIZATION_ERROR",
            SessionError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the caller can retry the same operation without fixing input first
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::ConnectTimeout(_)
                | SessionError::ConnectError(_)
                | SessionError::ChannelNotReady { .. }
                | SessionError::TransportError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SessionError::AuthTokenMissing.code(), "AUTH_TOKEN_MISSING");
        assert_eq!(SessionError::ConnectTimeout(10_000).code(), "CONNECT_TIMEOUT");
        let not_ready = SessionError::ChannelNotReady {
            kind: ChannelKind::Call,
            state: ConnectionState::Reconnecting,
        };
        assert_eq!(not_ready.code(), "CHANNEL_NOT_READY");
        assert_eq!(
            not_ready.to_string(),
            "Channel call is not ready (state: reconnecting)"
        );
    }

    #[test]
    fn test_auth_missing_is_not_retryable() {
        assert!(!SessionError::AuthTokenMissing.is_retryable());
        assert!(SessionError::ConnectError("refused".into()).is_retryable());
    }
}
