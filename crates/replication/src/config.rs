//! Maintenance scheduling.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ReplicationError, Result};

/// Pause between maintenance rounds, drawn uniformly from
/// `[min_interval_ms, max_interval_ms]` so peers do not run in lockstep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_000,
            max_interval_ms: 3_000,
        }
    }
}

impl MaintenanceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_ms > self.max_interval_ms {
            return Err(ReplicationError::InvalidConfig(format!(
                "min_interval_ms ({}) exceeds max_interval_ms ({})",
                self.min_interval_ms, self.max_interval_ms
            )));
        }
        Ok(())
    }

    /// Next pause between rounds.
    pub fn jittered_delay(&self) -> Duration {
        let ms = if self.min_interval_ms >= self.max_interval_ms {
            self.min_interval_ms
        } else {
            rand::thread_rng().gen_range(self.min_interval_ms..=self.max_interval_ms)
        };
        Duration::from_millis(ms)
    }

    /// Short intervals for in-process tests.
    pub fn test_config() -> Self {
        Self {
            min_interval_ms: 5,
            max_interval_ms: 15,
        }
    }
}
