//! Store Module
//!
//! In-memory transaction state machine and path registry.
//!
//! ## Responsibilities
//! - Issue strictly increasing LSNs at BeginTx
//! - Track open transactions until CommitTx/RollbackTx
//! - Record which paths exist and list them for Readdir
//!
//! Nothing survives a restart; content bytes are never stored.

mod listing;
mod manager;
mod registry;
mod transaction;

use crate::protocol::{Response, Status};

pub use listing::DirListing;
pub use manager::{TransactionStore, FIRST_LSN};
pub use registry::PathRegistry;
pub use transaction::{Transaction, TxState};

/// Outcome of one store operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpResult {
    pub status: Status,

    /// Set for BeginTx/CommitTx, zero otherwise
    pub lsn: u32,

    /// Set for Readdir, empty otherwise
    pub payload: Vec<u8>,
}

impl OpResult {
    pub fn ok() -> Self {
        Self::with_lsn(0)
    }

    pub fn with_lsn(lsn: u32) -> Self {
        Self {
            status: Status::OK,
            lsn,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            status: Status::OK,
            lsn: 0,
            payload,
        }
    }

    pub fn failed(status: Status) -> Self {
        Self {
            status,
            lsn: 0,
            payload: Vec::new(),
        }
    }

    /// Package as the reply to the given transaction
    pub fn into_response(self, transaction_id: u64) -> Response {
        Response {
            transaction_id,
            status: self.status,
            lsn: self.lsn,
            payload: self.payload,
        }
    }
}

/// Snapshot of store counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub active_transactions: usize,
    pub registered_paths: usize,
    pub lsns_issued: u64,

    /// `None` once the LSN space is exhausted
    pub next_lsn: Option<u32>,
}
