//! Transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Deadline for one full request/response exchange.
    pub rpc_timeout_ms: u64,
    /// Largest frame accepted in either direction.
    pub max_frame_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: 2_000,
            max_frame_len: 1024 * 1024,
        }
    }
}

impl TransportConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
