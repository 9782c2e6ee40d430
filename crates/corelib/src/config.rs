//! Ring configuration.

use crate::error::{Error, Result};
use crate::keyspace::{KeySpace, MAX_DIGITS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one ring member.
///
/// All peers of a ring must agree on `interval_digits`; the rest is local.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Decimal digits per identifier; the ring has `10^interval_digits` slots.
    pub interval_digits: u32,
    /// Successors remembered beyond the immediate one, for failover.
    pub successor_list_size: usize,
    /// Longest forwarding chain a lookup may take before giving up.
    pub max_hops: u32,
    /// Pause between join attempts against an unresponsive seed.
    pub join_retry_delay_ms: u64,
    /// `None` retries the seed forever.
    pub join_max_attempts: Option<u32>,
    /// Chance that fix-fingers moves past a slot whose lookup failed.
    pub finger_skip_probability: f64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            interval_digits: 3,
            successor_list_size: 3,
            max_hops: 64,
            join_retry_delay_ms: 5_000,
            join_max_attempts: None,
            finger_skip_probability: 1.0 / 11.0,
        }
    }
}

impl RingConfig {
    /// Check ranges and build the matching key space.
    pub fn validate(&self) -> Result<KeySpace> {
        if self.interval_digits == 0 || self.interval_digits > MAX_DIGITS {
            return Err(Error::InvalidConfig(format!(
                "interval_digits must be in 1..={MAX_DIGITS}, got {}",
                self.interval_digits
            )));
        }
        if self.successor_list_size == 0 {
            return Err(Error::InvalidConfig(
                "successor_list_size must be at least 1".into(),
            ));
        }
        if self.max_hops == 0 {
            return Err(Error::InvalidConfig("max_hops must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.finger_skip_probability) {
            return Err(Error::InvalidConfig(format!(
                "finger_skip_probability must be in [0, 1], got {}",
                self.finger_skip_probability
            )));
        }
        KeySpace::new(self.interval_digits)
    }

    pub fn join_retry_delay(&self) -> Duration {
        Duration::from_millis(self.join_retry_delay_ms)
    }

    /// Config with short delays for in-process tests.
    pub fn test_config() -> Self {
        Self {
            join_retry_delay_ms: 10,
            join_max_attempts: Some(3),
            ..Self::default()
        }
    }
}
