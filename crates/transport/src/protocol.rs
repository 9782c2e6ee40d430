//! Request and response messages, one pair per peer operation.

use serde::{Deserialize, Serialize};

use corelib::{Identifier, Lookup, PeerRef};
use replication::{BackupPoll, Timestamp};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Request {
    GetSuccessor,
    GetPredecessor,
    FindSuccessor {
        key: Identifier,
        origin: Identifier,
        hops: u32,
    },
    Notify {
        candidate: PeerRef,
    },
    ClosestFinger {
        key: Identifier,
    },
    AddRecord {
        record_id: String,
    },
    TransferRecords {
        boundary: Identifier,
    },
    AddBackupObligation {
        master: PeerRef,
        record_id: String,
    },
    PollBackupData {
        key: Identifier,
        since: Timestamp,
        requester: Identifier,
    },
}

impl Request {
    /// Operation name, for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetSuccessor => "GetSuccessor",
            Request::GetPredecessor => "GetPredecessor",
            Request::FindSuccessor { .. } => "FindSuccessor",
            Request::Notify { .. } => "Notify",
            Request::ClosestFinger { .. } => "ClosestFinger",
            Request::AddRecord { .. } => "AddRecord",
            Request::TransferRecords { .. } => "TransferRecords",
            Request::AddBackupObligation { .. } => "AddBackupObligation",
            Request::PollBackupData { .. } => "PollBackupData",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Successor(Option<PeerRef>),
    Predecessor(Option<PeerRef>),
    Lookup(Lookup),
    Finger(PeerRef),
    RecordIds(Vec<String>),
    BackupData(BackupPoll),
    Ok,
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_names_match_operations() {
        let request = Request::PollBackupData {
            key: Identifier(314),
            since: 0,
            requester: Identifier(700),
        };
        assert_eq!(request.name(), "PollBackupData");
        assert_eq!(Request::GetSuccessor.name(), "GetSuccessor");
    }

    #[test]
    fn test_lookup_response_survives_bincode() {
        let peer = PeerRef::with_identifier("127.0.0.1", 5000, Identifier(383));
        let response = Response::Lookup(Lookup::found(peer, corelib::Route::LocalOwner, 3));
        let bytes = bincode::serialize(&response).unwrap();
        let back: Response = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, response);
    }
}
