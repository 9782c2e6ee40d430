//! Outbound calls over TCP.

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::trace;

use corelib::{Identifier, Lookup, PeerRef, PeerTransport, TransportError};
use replication::{BackupPoll, RecordTransport, Timestamp};

use crate::codec;
use crate::config::TransportConfig;
use crate::error::WireError;
use crate::protocol::{Request, Response};

/// Opens one TCP connection per call and bounds the whole exchange by
/// `rpc_timeout_ms`.
#[derive(Clone, Debug, Default)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Send `request` to `to` and wait for its response.
    pub async fn call(&self, to: &PeerRef, request: Request) -> Result<Response, TransportError> {
        let name = request.name();
        trace!(peer = %to, request = name, "calling peer");
        match tokio::time::timeout(self.config.rpc_timeout(), self.exchange(to, &request)).await {
            Ok(Ok(Response::Error { message })) => {
                Err(WireError::Remote(message).into_transport(to))
            }
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(err.into_transport(to)),
            Err(_) => Err(TransportError::Timeout { peer: to.clone() }),
        }
    }

    async fn exchange(&self, to: &PeerRef, request: &Request) -> Result<Response, WireError> {
        let mut stream = TcpStream::connect(to.endpoint()).await?;
        codec::write_frame(&mut stream, request, self.config.max_frame_len).await?;
        codec::read_frame(&mut stream, self.config.max_frame_len).await
    }
}

fn unexpected(to: &PeerRef, request: &'static str) -> TransportError {
    WireError::Unexpected { request }.into_transport(to)
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn get_successor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        match self.call(to, Request::GetSuccessor).await? {
            Response::Successor(successor) => Ok(successor),
            _ => Err(unexpected(to, "GetSuccessor")),
        }
    }

    async fn get_predecessor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        match self.call(to, Request::GetPredecessor).await? {
            Response::Predecessor(predecessor) => Ok(predecessor),
            _ => Err(unexpected(to, "GetPredecessor")),
        }
    }

    async fn find_successor(
        &self,
        to: &PeerRef,
        key: Identifier,
        origin: Identifier,
        hops: u32,
    ) -> Result<Lookup, TransportError> {
        let request = Request::FindSuccessor { key, origin, hops };
        match self.call(to, request).await? {
            Response::Lookup(lookup) => Ok(lookup),
            _ => Err(unexpected(to, "FindSuccessor")),
        }
    }

    async fn notify(&self, to: &PeerRef, candidate: &PeerRef) -> Result<(), TransportError> {
        let request = Request::Notify {
            candidate: candidate.clone(),
        };
        match self.call(to, request).await? {
            Response::Ok => Ok(()),
            _ => Err(unexpected(to, "Notify")),
        }
    }

    async fn closest_finger(
        &self,
        to: &PeerRef,
        key: Identifier,
    ) -> Result<PeerRef, TransportError> {
        match self.call(to, Request::ClosestFinger { key }).await? {
            Response::Finger(peer) => Ok(peer),
            _ => Err(unexpected(to, "ClosestFinger")),
        }
    }
}

#[async_trait]
impl RecordTransport for TcpTransport {
    async fn add_record(&self, to: &PeerRef, record_id: &str) -> Result<(), TransportError> {
        let request = Request::AddRecord {
            record_id: record_id.to_string(),
        };
        match self.call(to, request).await? {
            Response::Ok => Ok(()),
            _ => Err(unexpected(to, "AddRecord")),
        }
    }

    async fn transfer_records(
        &self,
        to: &PeerRef,
        boundary: Identifier,
    ) -> Result<Vec<String>, TransportError> {
        match self.call(to, Request::TransferRecords { boundary }).await? {
            Response::RecordIds(ids) => Ok(ids),
            _ => Err(unexpected(to, "TransferRecords")),
        }
    }

    async fn add_backup(
        &self,
        to: &PeerRef,
        master: &PeerRef,
        record_id: &str,
    ) -> Result<(), TransportError> {
        let request = Request::AddBackupObligation {
            master: master.clone(),
            record_id: record_id.to_string(),
        };
        match self.call(to, request).await? {
            Response::Ok => Ok(()),
            _ => Err(unexpected(to, "AddBackupObligation")),
        }
    }

    async fn poll_backup_data(
        &self,
        to: &PeerRef,
        key: Identifier,
        since: Timestamp,
        requester: Identifier,
    ) -> Result<BackupPoll, TransportError> {
        let request = Request::PollBackupData {
            key,
            since,
            requester,
        };
        match self.call(to, request).await? {
            Response::BackupData(poll) => Ok(poll),
            _ => Err(unexpected(to, "PollBackupData")),
        }
    }
}
