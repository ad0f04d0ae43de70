//! Transaction records

/// Lifecycle of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Active,
    Committed,
    RolledBack,
}

/// Server-side record of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Client-chosen transaction id
    pub id: u64,

    /// Assigned at BeginTx, fixed for the transaction's lifetime
    pub lsn: u32,

    pub state: TxState,

    /// Operations received under this id while active (diagnostics only)
    pub operations: u64,
}

impl Transaction {
    /// Open a new active transaction
    pub fn begin(id: u64, lsn: u32) -> Self {
        Self {
            id,
            lsn,
            state: TxState::Active,
            operations: 0,
        }
    }

    /// Close as committed, consuming the active record
    pub fn commit(mut self) -> Self {
        self.state = TxState::Committed;
        self
    }

    /// Close as rolled back, consuming the active record
    pub fn roll_back(mut self) -> Self {
        self.state = TxState::RolledBack;
        self
    }

    pub fn is_active(&self) -> bool {
        self.state == TxState::Active
    }
}
