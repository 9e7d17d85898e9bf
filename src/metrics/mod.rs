//! Prometheus metrics for real-time session channels.
//!
//! - Channel lifecycle (connect attempts, reconnects, state per kind)
//! - Event flow (emitted, dropped while not connected, received, handler calls)

mod helpers;

pub use helpers::{encode_metrics, ChannelMetrics, EventMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, register_int_gauge_vec, IntCounterVec, IntGaugeVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "realtime";

lazy_static! {
    // ============================================================================
    // Channel Lifecycle Metrics
    // ============================================================================

    /// Connect attempts by channel kind and outcome
    pub static ref CONNECT_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_connect_attempts_total", METRIC_PREFIX),
        "Total connect attempts by channel kind and outcome",
        &["kind", "outcome"]
    ).unwrap();

    /// Reconnect attempts after a dropped connection
    pub static ref RECONNECT_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_reconnect_attempts_total", METRIC_PREFIX),
        "Total reconnect attempts by channel kind",
        &["kind"]
    ).unwrap();

    /// Current state per channel (0=disconnected 1=connecting 2=connected 3=reconnecting 4=failed)
    pub static ref CHANNEL_STATE: IntGaugeVec = register_int_gauge_vec!(
        format!("{}_channel_state", METRIC_PREFIX),
        "Current connection state per channel kind",
        &["kind"]
    ).unwrap();

    // ============================================================================
    // Event Metrics
    // ============================================================================

    /// Outbound events handed to the transport
    pub static ref EVENTS_EMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_emitted_total", METRIC_PREFIX),
        "Total outbound events handed to the transport",
        &["kind"]
    ).unwrap();

    /// Outbound events dropped because the channel was not connected
    pub static ref EVENTS_DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_dropped_total", METRIC_PREFIX),
        "Total outbound events dropped while the channel was not connected",
        &["kind"]
    ).unwrap();

    /// Inbound events delivered by the transport
    pub static ref EVENTS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_received_total", METRIC_PREFIX),
        "Total inbound events received",
        &["kind"]
    ).unwrap();

    /// Handler invocations for inbound events
    pub static ref HANDLER_INVOCATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_handler_invocations_total", METRIC_PREFIX),
        "Total handler invocations for inbound events",
        &["kind"]
    ).unwrap();

    /// Transport errors after a connection was established
    pub static ref TRANSPORT_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_transport_errors_total", METRIC_PREFIX),
        "Total asynchronous transport errors",
        &["kind"]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        // Initialize some metrics first (lazy_static requires first access)
        CHANNEL_STATE.with_label_values(&["chat"]).set(2);

        let output = encode_metrics().unwrap();
        assert!(output.contains("realtime_channel_state"));
    }

    #[test]
    fn test_event_metrics() {
        EVENTS_EMITTED_TOTAL.with_label_values(&["stream"]).inc();
        EVENTS_DROPPED_TOTAL.with_label_values(&["stream"]).inc();
        EVENTS_RECEIVED_TOTAL.with_label_values(&["stream"]).inc();
        HANDLER_INVOCATIONS_TOTAL.with_label_values(&["stream"]).inc_by(3);
        // Just verify no panics
    }
}
