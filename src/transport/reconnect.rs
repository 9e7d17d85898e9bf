//! Bounded, fixed-delay reconnection policy

use std::time::Duration;

use rand::Rng;

use crate::config::RealtimeConfig;

/// Reconnect configuration applied by the session driver after a drop
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Attempts before the channel is marked failed (0 disables reconnection)
    pub max_attempts: u32,
    /// Delay before every attempt
    pub delay: Duration,
    /// Jitter factor (0.0 to 1.0); 0.0 keeps the delay fixed
    pub randomization_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            randomization_factor: 0.0,
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            max_attempts: config.reconnect_attempts,
            delay: Duration::from_millis(config.reconnect_delay_ms),
            randomization_factor: config.randomization_factor.clamp(0.0, 1.0),
        }
    }

    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before the next attempt; every attempt waits the same base delay
    pub fn next_delay(&self) -> Duration {
        let base = self.delay.as_millis() as f64;

        // Apply jitter only if randomization_factor > 0
        let delay_ms = if self.randomization_factor > 0.0 && base > 0.0 {
            let jitter_range = base * self.randomization_factor;
            let jitter = rand::rng().random_range(-jitter_range..jitter_range);
            (base + jitter).max(1.0) as u64
        } else {
            base as u64
        };

        Duration::from_millis(delay_ms)
    }
}
