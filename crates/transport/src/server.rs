//! Inbound request handling over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use replication::Peer;

use crate::codec;
use crate::config::TransportConfig;
use crate::error::{Result, WireError};
use crate::protocol::{Request, Response};

/// Accepts peer connections and answers each with the local [`Peer`].
///
/// Bind first, build the peer around the bound address, then [`serve`](Server::serve).
pub struct Server {
    listener: TcpListener,
    config: TransportConfig,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, config: TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` flips or its sender is dropped.
    pub async fn serve(self, peer: Arc<Peer>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let local = self.local_addr()?;
        info!(addr = %local, node = %peer.local(), "server listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let peer = peer.clone();
                        let config = self.config.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, &peer, &config).await {
                                debug!(%remote, error = %err, "connection failed");
                            }
                        });
                    }
                    Err(err) => warn!(error = %err, "accept failed"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(addr = %local, "server stopped");
        Ok(())
    }
}

/// Answer one request. Reads and writes each get `rpc_timeout`; a connection
/// that stalls past it is dropped.
async fn handle_connection(
    mut stream: TcpStream,
    peer: &Peer,
    config: &TransportConfig,
) -> Result<()> {
    let deadline = config.rpc_timeout();
    let max_len = config.max_frame_len;

    let request: Request = match timeout(deadline, codec::read_frame(&mut stream, max_len)).await {
        Err(_) => return Err(WireError::Deadline(deadline)),
        Ok(Ok(request)) => request,
        Ok(Err(err @ WireError::FrameTooLarge { len, .. })) => {
            warn!(error = %err, "rejecting oversized request");
            // unread input would turn our close into a reset before the reply lands
            let mut payload = (&mut stream).take(len as u64);
            timeout(deadline, tokio::io::copy(&mut payload, &mut tokio::io::sink()))
                .await
                .map_err(|_| WireError::Deadline(deadline))??;
            let response = Response::Error {
                message: err.to_string(),
            };
            return write_response(&mut stream, &response, config).await;
        }
        Ok(Err(err)) => return Err(err),
    };

    debug!(request = request.name(), "handling request");
    let response = dispatch(peer, request).await;
    write_response(&mut stream, &response, config).await
}

async fn write_response(
    stream: &mut TcpStream,
    response: &Response,
    config: &TransportConfig,
) -> Result<()> {
    let deadline = config.rpc_timeout();
    timeout(deadline, codec::write_frame(stream, response, config.max_frame_len))
        .await
        .map_err(|_| WireError::Deadline(deadline))?
}

/// Run one inbound request against the local peer.
pub async fn dispatch(peer: &Peer, request: Request) -> Response {
    let ring = peer.ring();
    let ledger = peer.ledger();
    match request {
        Request::GetSuccessor => Response::Successor(Some(ring.successor())),
        Request::GetPredecessor => Response::Predecessor(ring.predecessor()),
        Request::FindSuccessor { key, origin, hops } => {
            Response::Lookup(ring.find_successor(key, origin, hops).await)
        }
        Request::Notify { candidate } => {
            ring.notify(&candidate);
            Response::Ok
        }
        Request::ClosestFinger { key } => Response::Finger(ring.closest_preceding_finger(key)),
        Request::AddRecord { record_id } => {
            ledger.add_record(&record_id);
            Response::Ok
        }
        Request::TransferRecords { boundary } => {
            Response::RecordIds(ledger.transfer_records(boundary))
        }
        Request::AddBackupObligation { master, record_id } => {
            ledger.add_backup(master, &record_id);
            Response::Ok
        }
        Request::PollBackupData {
            key,
            since,
            requester,
        } => Response::BackupData(ledger.latest_data(key, since, requester)),
    }
}
