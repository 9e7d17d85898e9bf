mod settings;

pub use settings::{
    AuthConfig, EndpointsConfig, NamespaceConfig, OtelConfig, RealtimeConfig, Settings,
};
