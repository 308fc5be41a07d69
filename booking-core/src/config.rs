use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and cache knobs for a booking flow.
///
/// Every field has a default, so a partial `[booking]` table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Quiet period before a debounced draft update is applied.
    pub debounce_ms: u64,
    /// How long the success notification stays up.
    pub notification_timeout_ms: u64,
    pub coupon_cache_ttl_secs: u64,
    pub coupon_cache_capacity: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            notification_timeout_ms: 3000,
            coupon_cache_ttl_secs: 30,
            coupon_cache_capacity: 100,
        }
    }
}

impl FlowConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    pub fn coupon_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.coupon_cache_ttl_secs)
    }
}
