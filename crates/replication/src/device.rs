//! Device polling collaborator.

use async_trait::async_trait;

/// Result of pulling a device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reading {
    Value(f64),
    Unavailable,
}

/// Source of sensor readings, keyed by record id.
#[async_trait]
pub trait DeviceReader: Send + Sync + 'static {
    async fn pull(&self, record_id: &str) -> Reading;
}

/// Reader for nodes without device access.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDevice;

#[async_trait]
impl DeviceReader for NoDevice {
    async fn pull(&self, _record_id: &str) -> Reading {
        Reading::Unavailable
    }
}

/// Reader that reports the same value for every device.
#[derive(Clone, Copy, Debug)]
pub struct FixedReader(pub f64);

#[async_trait]
impl DeviceReader for FixedReader {
    async fn pull(&self, _record_id: &str) -> Reading {
        Reading::Value(self.0)
    }
}
