//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::session::{ChannelKind, ConnectionState};

use super::{
    CHANNEL_STATE, CONNECT_ATTEMPTS_TOTAL, EVENTS_DROPPED_TOTAL, EVENTS_EMITTED_TOTAL,
    EVENTS_RECEIVED_TOTAL, HANDLER_INVOCATIONS_TOTAL, RECONNECT_ATTEMPTS_TOTAL,
    TRANSPORT_ERRORS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording channel lifecycle metrics
pub struct ChannelMetrics;

impl ChannelMetrics {
    /// Record the outcome of an initial connect ("connected", "timeout", "error", "no_token")
    pub fn record_connect(kind: ChannelKind, outcome: &str) {
        CONNECT_ATTEMPTS_TOTAL
            .with_label_values(&[kind.as_str(), outcome])
            .inc();
    }

    pub fn record_reconnect_attempt(kind: ChannelKind) {
        RECONNECT_ATTEMPTS_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_state(kind: ChannelKind, state: ConnectionState) {
        CHANNEL_STATE
            .with_label_values(&[kind.as_str()])
            .set(state.as_gauge());
    }

    pub fn record_transport_error(kind: ChannelKind) {
        TRANSPORT_ERRORS_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }
}

/// Helper struct for recording event flow metrics
pub struct EventMetrics;

impl EventMetrics {
    pub fn record_emitted(kind: ChannelKind) {
        EVENTS_EMITTED_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_dropped(kind: ChannelKind) {
        EVENTS_DROPPED_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record an inbound event and how many handlers it reached
    pub fn record_received(kind: ChannelKind, handlers: usize) {
        EVENTS_RECEIVED_TOTAL.with_label_values(&[kind.as_str()]).inc();
        if handlers > 0 {
            HANDLER_INVOCATIONS_TOTAL
                .with_label_values(&[kind.as_str()])
                .inc_by(handlers as u64);
        }
    }
}
