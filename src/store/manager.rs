//! Transaction Store
//!
//! In-memory state machine behind the mock kernel: open transactions, the LSN
//! counter, and the path registry.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::{Operation, Request, Status};

use super::{DirListing, OpResult, PathRegistry, StoreStats, Transaction};

/// First LSN handed out by a fresh store
pub const FIRST_LSN: u32 = 1;

/// Permissive transactional-filesystem test double
///
/// ## Concurrency:
/// - One mutex guards the LSN counter, the active-transaction map and the
///   path registry together, so every operation is atomic and LSN order
///   matches BeginTx arrival order across connections.
/// - All methods use `&self`; share the store as `Arc<TransactionStore>`.
///
/// ## Permissiveness:
/// Unknown transaction ids, duplicate creates and deletes of absent paths
/// are all acknowledged. Nothing here rejects a request.
pub struct TransactionStore {
    state: Mutex<StoreState>,
}

struct StoreState {
    /// Next LSN to issue; `None` once the 32-bit space is used up
    next_lsn: Option<u32>,

    lsns_issued: u64,

    active: HashMap<u64, Transaction>,

    registry: PathRegistry,
}

impl StoreState {
    /// Bump the diagnostic counter of an active transaction, if any
    fn note_operation(&mut self, tx_id: u64) {
        if let Some(tx) = self.active.get_mut(&tx_id) {
            tx.operations += 1;
        }
    }
}

impl TransactionStore {
    /// Create an empty store whose first BeginTx gets LSN 1
    pub fn new() -> Self {
        Self::starting_at(FIRST_LSN)
    }

    /// Create an empty store that issues `first_lsn` next
    pub fn starting_at(first_lsn: u32) -> Self {
        Self {
            state: Mutex::new(StoreState {
                next_lsn: Some(first_lsn),
                lsns_issued: 0,
                active: HashMap::new(),
                registry: PathRegistry::new(),
            }),
        }
    }

    /// Execute a decoded request
    ///
    /// Routes the operation to its handler and packages the outcome.
    pub fn execute(&self, request: &Request) -> OpResult {
        let tx_id = request.transaction_id;

        match request.operation {
            Operation::BeginTx => match self.begin_tx(tx_id) {
                Some(lsn) => OpResult::with_lsn(lsn),
                None => OpResult::failed(Status::LSN_EXHAUSTED),
            },
            Operation::CommitTx => {
                let lsn = self.commit_tx(tx_id).map(|tx| tx.lsn).unwrap_or(0);
                OpResult::with_lsn(lsn)
            }
            Operation::RollbackTx => {
                self.rollback_tx(tx_id);
                OpResult::ok()
            }
            Operation::CreateFile => {
                self.create_file(tx_id, &request.path);
                OpResult::ok()
            }
            Operation::DeleteFile => {
                self.delete_file(tx_id, &request.path);
                OpResult::ok()
            }
            Operation::WriteFile => {
                self.write_file(tx_id, &request.path, request.offset, &request.payload);
                OpResult::ok()
            }
            Operation::Mkdir => {
                self.mkdir(tx_id, &request.path);
                OpResult::ok()
            }
            Operation::Readdir => match self.readdir(tx_id, &request.path) {
                Ok(listing) => OpResult::with_payload(listing),
                Err(e) => {
                    tracing::warn!("TX-{}: READDIR failed to serialize listing: {}", tx_id, e);
                    OpResult::failed(Status::PROTOCOL_ERROR)
                }
            },
            Operation::Unknown(code) => {
                tracing::debug!("TX-{}: unknown operation {} acknowledged", tx_id, code);
                OpResult::ok()
            }
        }
    }

    // =========================================================================
    // Transaction Lifecycle
    // =========================================================================

    /// Open a transaction and assign it the next LSN
    ///
    /// Reusing an id that is still active replaces the old record.
    /// Returns `None` only when the LSN space is exhausted.
    pub fn begin_tx(&self, tx_id: u64) -> Option<u32> {
        let mut state = self.state.lock();

        let Some(lsn) = state.next_lsn else {
            tracing::warn!("TX-{}: BEGIN refused, LSN space exhausted", tx_id);
            return None;
        };
        state.next_lsn = lsn.checked_add(1);
        state.lsns_issued += 1;

        if let Some(previous) = state.active.insert(tx_id, Transaction::begin(tx_id, lsn)) {
            tracing::debug!(
                "TX-{}: BEGIN replaces still-active transaction (LSN={})",
                tx_id,
                previous.lsn
            );
        }

        tracing::debug!("TX-{}: BEGIN -> LSN={}", tx_id, lsn);
        Some(lsn)
    }

    /// Close a transaction as committed
    ///
    /// Returns the closed record, or `None` if no transaction was open.
    pub fn commit_tx(&self, tx_id: u64) -> Option<Transaction> {
        let mut state = self.state.lock();

        let committed = state.active.remove(&tx_id).map(Transaction::commit);
        match &committed {
            Some(tx) => tracing::debug!(
                "TX-{}: COMMIT -> LSN={} ({} operations)",
                tx_id,
                tx.lsn,
                tx.operations
            ),
            None => tracing::debug!("TX-{}: COMMIT of unknown transaction", tx_id),
        }
        committed
    }

    /// Close a transaction as rolled back, if one is open
    pub fn rollback_tx(&self, tx_id: u64) -> Option<Transaction> {
        let mut state = self.state.lock();

        tracing::debug!("TX-{}: ROLLBACK", tx_id);
        state.active.remove(&tx_id).map(Transaction::roll_back)
    }

    // =========================================================================
    // Filesystem Operations
    // =========================================================================

    /// Register a path with empty content. Returns false if already present.
    pub fn create_file(&self, tx_id: u64, path: &str) -> bool {
        let mut state = self.state.lock();

        tracing::debug!("TX-{}: CREATE {}", tx_id, path);
        state.note_operation(tx_id);
        state.registry.insert(path)
    }

    /// Unregister a path. Returns false if it was absent.
    pub fn delete_file(&self, tx_id: u64, path: &str) -> bool {
        let mut state = self.state.lock();

        tracing::debug!("TX-{}: DELETE {}", tx_id, path);
        state.note_operation(tx_id);
        state.registry.remove(path)
    }

    /// Record a write. Content is not stored.
    pub fn write_file(&self, tx_id: u64, path: &str, offset: u64, data: &[u8]) {
        let mut state = self.state.lock();

        tracing::debug!("TX-{}: WRITE {} @{} ({} bytes)", tx_id, path, offset, data.len());
        state.note_operation(tx_id);
    }

    /// Acknowledge a directory creation. Directories are not tracked.
    pub fn mkdir(&self, tx_id: u64, path: &str) {
        let mut state = self.state.lock();

        tracing::debug!("TX-{}: MKDIR {}", tx_id, path);
        state.note_operation(tx_id);
    }

    /// Serialize every registered path as a JSON array, in insertion order
    ///
    /// The path argument is logged only; the listing is never filtered.
    pub fn readdir(&self, tx_id: u64, path: &str) -> Result<Vec<u8>> {
        let listing = {
            let mut state = self.state.lock();

            tracing::debug!("TX-{}: READDIR {}", tx_id, path);
            state.note_operation(tx_id);
            DirListing(state.registry.paths().map(str::to_string).collect())
        };

        listing.to_json()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Registered paths in insertion order
    pub fn paths(&self) -> Vec<String> {
        self.state.lock().registry.paths().map(str::to_string).collect()
    }

    /// Whether a path is currently registered
    pub fn contains_path(&self, path: &str) -> bool {
        self.state.lock().registry.contains(path)
    }

    /// The open transaction for an id, if any
    pub fn active_transaction(&self, tx_id: u64) -> Option<Transaction> {
        self.state.lock().active.get(&tx_id).cloned()
    }

    /// Point-in-time counters
    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();
        StoreStats {
            active_transactions: state.active.len(),
            registered_paths: state.registry.len(),
            lsns_issued: state.lsns_issued,
            next_lsn: state.next_lsn,
        }
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}
