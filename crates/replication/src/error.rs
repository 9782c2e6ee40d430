//! Error types for record replication.

use corelib::{LookupFailure, TransportError};

pub type Result<T> = std::result::Result<T, ReplicationError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplicationError {
    /// The ring could not name an owner for the record.
    #[error("could not resolve owner of record {record_id}: {reason}")]
    Unresolved {
        record_id: String,
        reason: LookupFailure,
    },
    /// The owner was resolved but the request never reached it.
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Ring(#[from] corelib::Error),
    #[error("invalid maintenance config: {0}")]
    InvalidConfig(String),
}
