use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

use crate::error::Result;
use crate::session::ChannelKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Reconnect attempts after an established connection drops
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Delay before each reconnect attempt in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Reconnect delay jitter (0.0 to 1.0)
    #[serde(default)]
    pub randomization_factor: f64,
    /// Initial handshake timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// How long disconnect waits for a channel task to close its socket
    #[serde(default = "default_teardown_timeout_ms")]
    pub teardown_timeout_ms: u64,
}

fn default_reconnect_attempts() -> u32 {
    3
}

fn default_reconnect_delay_ms() -> u64 {
    1000 // 1 second
}

fn default_connect_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_teardown_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceConfig {
    /// Empty means the kind's own path (`/chat`, `/call`, `/stream`)
    #[serde(default)]
    pub namespace: String,
    /// Overrides `endpoints.base_url` for this channel only
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    #[serde(default = "default_chat_namespace")]
    pub chat: NamespaceConfig,
    #[serde(default = "default_call_namespace")]
    pub call: NamespaceConfig,
    #[serde(default = "default_stream_namespace")]
    pub stream: NamespaceConfig,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_socket_path() -> String {
    "/socket.io".to_string()
}

fn namespace(path: &str) -> NamespaceConfig {
    NamespaceConfig {
        namespace: path.to_string(),
        base_url: None,
    }
}

fn default_chat_namespace() -> NamespaceConfig {
    namespace("/chat")
}

fn default_call_namespace() -> NamespaceConfig {
    namespace("/call")
}

fn default_stream_namespace() -> NamespaceConfig {
    namespace("/stream")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Environment variable the probe binary reads the bearer token from
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "REALTIME_TOKEN".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "realtime-sessions".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("realtime.reconnect_attempts", 3)?
            .set_default("realtime.reconnect_delay_ms", 1000)?
            .set_default("realtime.connect_timeout_ms", 10_000)?
            .set_default("endpoints.base_url", default_base_url())?
            .set_default("endpoints.socket_path", default_socket_path())?
            .set_default("endpoints.chat.namespace", "/chat")?
            .set_default("endpoints.call.namespace", "/call")?
            .set_default("endpoints.stream.namespace", "/stream")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // REALTIME__ENDPOINTS__BASE_URL, REALTIME__REALTIME__RECONNECT_ATTEMPTS, etc.
            .add_source(
                Environment::with_prefix("REALTIME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_config(builder.build()?)
    }

    /// Deserialize an already layered `Config`
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(config.try_deserialize()?)
    }
}

impl EndpointsConfig {
    pub fn namespace_for(&self, kind: ChannelKind) -> &NamespaceConfig {
        match kind {
            ChannelKind::Chat => &self.chat,
            ChannelKind::Call => &self.call,
            ChannelKind::Stream => &self.stream,
        }
    }

    /// Namespace path for `kind`; a table that only overrides the host keeps the default path
    pub fn namespace_path(&self, kind: ChannelKind) -> String {
        let configured = self.namespace_for(kind).namespace.trim();
        if configured.is_empty() {
            format!("/{}", kind)
        } else {
            configured.to_string()
        }
    }

    /// Base URL for `kind`, honoring a per-channel override
    pub fn base_url_for(&self, kind: ChannelKind) -> &str {
        self.namespace_for(kind)
            .base_url
            .as_deref()
            .unwrap_or(&self.base_url)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            randomization_factor: 0.0,
            connect_timeout_ms: default_connect_timeout_ms(),
            teardown_timeout_ms: default_teardown_timeout_ms(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            socket_path: default_socket_path(),
            chat: default_chat_namespace(),
            call: default_call_namespace(),
            stream: default_stream_namespace(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let realtime = RealtimeConfig::default();
        assert_eq!(realtime.reconnect_attempts, 3);
        assert_eq!(realtime.reconnect_delay_ms, 1000);
        assert_eq!(realtime.connect_timeout_ms, 10_000);
    }

    #[test]
    fn test_per_kind_base_url_override() {
        let mut endpoints = EndpointsConfig::default();
        endpoints.stream.base_url = Some("http://live.example.com:5001".to_string());

        assert_eq!(endpoints.base_url_for(ChannelKind::Chat), "http://localhost:5000");
        assert_eq!(
            endpoints.base_url_for(ChannelKind::Stream),
            "http://live.example.com:5001"
        );
        assert_eq!(endpoints.namespace_for(ChannelKind::Call).namespace, "/call");
    }

    #[test]
    fn test_deserialize_partial_settings() {
        let settings: Settings = Config::builder()
            .set_override("realtime.reconnect_attempts", 5)
            .unwrap()
            .set_override("endpoints.chat.namespace", "/messages")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.realtime.reconnect_attempts, 5);
        assert_eq!(settings.realtime.reconnect_delay_ms, 1000);
        assert_eq!(settings.endpoints.chat.namespace, "/messages");
        assert_eq!(settings.endpoints.stream.namespace, "/stream");
        assert!(!settings.otel.enabled);
    }

    #[test]
    fn test_malformed_value_is_config_error() {
        let config = Config::builder()
            .set_override("realtime.reconnect_attempts", "many")
            .unwrap()
            .build()
            .unwrap();

        let err = Settings::from_config(config).unwrap_err();
        assert!(matches!(err, crate::error::SessionError::Config(_)));
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_host_override_alone_loads() {
        let settings: Settings = Config::builder()
            .set_override("endpoints.stream.base_url", "http://live.example.com:5001")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let endpoints = &settings.endpoints;
        assert_eq!(
            endpoints.base_url_for(ChannelKind::Stream),
            "http://live.example.com:5001"
        );
        assert_eq!(endpoints.namespace_path(ChannelKind::Stream), "/stream");
        assert_eq!(endpoints.namespace_path(ChannelKind::Chat), "/chat");
        assert_eq!(endpoints.base_url_for(ChannelKind::Chat), "http://localhost:5000");
    }
}
