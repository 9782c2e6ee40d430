//! A complete ring member: ring node, record ledger and maintenance task.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use corelib::{PeerRef, PeerTransport, RingConfig, RingNode};

use crate::config::MaintenanceConfig;
use crate::device::{DeviceReader, NoDevice};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::log::{MeasurementLog, MemoryLog};
use crate::transport::RecordTransport;

pub struct Peer {
    ring: Arc<RingNode>,
    ledger: Ledger,
    maintenance: MaintenanceConfig,
}

/// Builder for [`Peer`].
///
/// # Example
///
/// ```ignore
/// let peer = PeerBuilder::new(local)
///     .ring_config(RingConfig::default())
///     .device(Arc::new(FixedReader(21.5)))
///     .build(transport)?;
/// ```
pub struct PeerBuilder {
    local: PeerRef,
    ring_config: RingConfig,
    maintenance: MaintenanceConfig,
    log: Option<Arc<dyn MeasurementLog>>,
    device: Option<Arc<dyn DeviceReader>>,
}

impl PeerBuilder {
    pub fn new(local: PeerRef) -> Self {
        Self {
            local,
            ring_config: RingConfig::default(),
            maintenance: MaintenanceConfig::default(),
            log: None,
            device: None,
        }
    }

    pub fn ring_config(mut self, config: RingConfig) -> Self {
        self.ring_config = config;
        self
    }

    pub fn maintenance(mut self, config: MaintenanceConfig) -> Self {
        self.maintenance = config;
        self
    }

    /// Defaults to an empty [`MemoryLog`].
    pub fn log(mut self, log: Arc<dyn MeasurementLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Defaults to [`NoDevice`].
    pub fn device(mut self, device: Arc<dyn DeviceReader>) -> Self {
        self.device = Some(device);
        self
    }

    /// Build the peer around a transport that speaks both ring and record
    /// operations.
    pub fn build<T>(self, transport: Arc<T>) -> Result<Peer>
    where
        T: PeerTransport + RecordTransport,
    {
        self.maintenance.validate()?;

        let ring_transport: Arc<dyn PeerTransport> = transport.clone();
        let record_transport: Arc<dyn RecordTransport> = transport;
        let ring = Arc::new(RingNode::new(self.local, self.ring_config, ring_transport)?);

        let log = self.log.unwrap_or_else(|| Arc::new(MemoryLog::new()));
        let device = self.device.unwrap_or_else(|| Arc::new(NoDevice));
        let ledger = Ledger::new(ring.clone(), record_transport, log, device);

        Ok(Peer {
            ring,
            ledger,
            maintenance: self.maintenance,
        })
    }
}

impl Peer {
    pub fn ring(&self) -> &RingNode {
        &self.ring
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn local(&self) -> &PeerRef {
        self.ring.local()
    }

    /// Join the ring `seed` belongs to and take over the records that now
    /// fall into our interval.
    ///
    /// A failed take-over is logged, not returned: the node is a ring member
    /// either way and the successor keeps serving those records.
    pub async fn join(&self, seed: &PeerRef) -> Result<PeerRef> {
        let successor = self.ring.join(seed).await?;
        match self.ledger.take_over_from_successor().await {
            Ok(count) => debug!(node = %self.local(), count, "ownership transfer done"),
            Err(err) => {
                warn!(node = %self.local(), successor = %successor, error = %err, "ownership transfer failed");
            }
        }
        Ok(successor)
    }

    pub fn leave(&self) {
        self.ring.leave();
    }

    /// Ring maintenance followed by replication bookkeeping.
    pub async fn maintenance_round(&self) {
        self.ring.maintenance_round().await;
        self.ledger.maintenance_round().await;
    }

    /// Run maintenance rounds in the background until `shutdown` flips or
    /// its sender is dropped.
    pub fn spawn_maintenance(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(node = %self.local(), "maintenance loop started");
            loop {
                let delay = self.maintenance.jittered_delay();
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        self.maintenance_round().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!(node = %self.local(), "maintenance loop stopped");
        })
    }
}
