//! Request definitions
//!
//! Represents operations sent by the host client.

use std::fmt;

/// Operation codes carried in the request's op byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    BeginTx,
    WriteFile,
    CreateFile,
    DeleteFile,
    Mkdir,
    Readdir,
    CommitTx,
    RollbackTx,

    /// Any code outside 1..=8; acknowledged without effect
    Unknown(u8),
}

impl Operation {
    /// Map a wire code to an operation
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Operation::BeginTx,
            0x02 => Operation::WriteFile,
            0x03 => Operation::CreateFile,
            0x04 => Operation::DeleteFile,
            0x05 => Operation::Mkdir,
            0x06 => Operation::Readdir,
            0x07 => Operation::CommitTx,
            0x08 => Operation::RollbackTx,
            other => Operation::Unknown(other),
        }
    }

    /// The wire code for this operation
    pub fn code(self) -> u8 {
        match self {
            Operation::BeginTx => 0x01,
            Operation::WriteFile => 0x02,
            Operation::CreateFile => 0x03,
            Operation::DeleteFile => 0x04,
            Operation::Mkdir => 0x05,
            Operation::Readdir => 0x06,
            Operation::CommitTx => 0x07,
            Operation::RollbackTx => 0x08,
            Operation::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::BeginTx => f.write_str("BeginTx"),
            Operation::WriteFile => f.write_str("WriteFile"),
            Operation::CreateFile => f.write_str("CreateFile"),
            Operation::DeleteFile => f.write_str("DeleteFile"),
            Operation::Mkdir => f.write_str("Mkdir"),
            Operation::Readdir => f.write_str("Readdir"),
            Operation::CommitTx => f.write_str("CommitTx"),
            Operation::RollbackTx => f.write_str("RollbackTx"),
            Operation::Unknown(code) => write!(f, "Unknown({})", code),
        }
    }
}

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Logical transaction this operation belongs to (0 is valid)
    pub transaction_id: u64,

    /// What to do
    pub operation: Operation,

    /// Target path; empty for operations that don't use one
    pub path: String,

    /// Byte offset for WriteFile, zero otherwise
    pub offset: u64,

    /// Data to write for WriteFile, empty otherwise
    pub payload: Vec<u8>,
}

impl Request {
    /// Create a request with no path, offset, or payload
    pub fn new(transaction_id: u64, operation: Operation) -> Self {
        Self {
            transaction_id,
            operation,
            path: String::new(),
            offset: 0,
            payload: Vec::new(),
        }
    }

    /// Create a request that targets a path
    pub fn with_path(transaction_id: u64, operation: Operation, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::new(transaction_id, operation)
        }
    }

    /// Create a WriteFile request
    pub fn write(transaction_id: u64, path: impl Into<String>, offset: u64, payload: Vec<u8>) -> Self {
        Self {
            transaction_id,
            operation: Operation::WriteFile,
            path: path.into(),
            offset,
            payload,
        }
    }
}
