//! Protocol Module
//!
//! Defines the wire protocol between the host client and the mock kernel.
//!
//! ## Framing
//! Every message is preceded by a 4-byte big-endian length counting only the
//! bytes that follow.
//!
//! ### Operations
//! - 0x01: BeginTx
//! - 0x02: WriteFile   - path, offset, data
//! - 0x03: CreateFile  - path
//! - 0x04: DeleteFile  - path
//! - 0x05: Mkdir       - path
//! - 0x06: Readdir     - response data: JSON array of paths
//! - 0x07: CommitTx
//! - 0x08: RollbackTx
//!
//! Any other code is acknowledged with OK and has no effect.
//!
//! ### Status Codes
//! - 0: OK
//! - -1: PROTOCOL_ERROR (malformed frame, connection closes)
//! - -2: LSN_EXHAUSTED

mod codec;
mod frame;
mod request;
mod response;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE,
};
pub use frame::{read_frame, write_frame, LENGTH_PREFIX_SIZE};
pub use request::{Operation, Request};
pub use response::{Response, Status};
