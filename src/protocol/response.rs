//! Response definitions
//!
//! Represents replies sent back to the host client.

use std::fmt;

/// Signed result code carried in every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// Operation acknowledged
    pub const OK: Status = Status(0);

    /// Malformed frame; sent once before the connection closes
    pub const PROTOCOL_ERROR: Status = Status(-1);

    /// The 32-bit LSN space is used up, no transaction was opened
    pub const LSN_EXHAUSTED: Status = Status(-2);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::OK => f.write_str("OK"),
            Status::PROTOCOL_ERROR => f.write_str("PROTOCOL_ERROR"),
            Status::LSN_EXHAUSTED => f.write_str("LSN_EXHAUSTED"),
            Status(code) => write!(f, "STATUS({})", code),
        }
    }
}

/// A response to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Echo of the request's transaction id (0 when unattributable)
    pub transaction_id: u64,

    /// Result code
    pub status: Status,

    /// Log sequence number, set for BeginTx/CommitTx
    pub lsn: u32,

    /// Readdir listing, empty otherwise
    pub payload: Vec<u8>,
}

impl Response {
    /// Create an OK response
    pub fn ok(transaction_id: u64, lsn: u32, payload: Vec<u8>) -> Self {
        Self {
            transaction_id,
            status: Status::OK,
            lsn,
            payload,
        }
    }

    /// The best-effort reply for a frame that could not be decoded
    pub fn protocol_error() -> Self {
        Self {
            transaction_id: 0,
            status: Status::PROTOCOL_ERROR,
            lsn: 0,
            payload: Vec::new(),
        }
    }
}
