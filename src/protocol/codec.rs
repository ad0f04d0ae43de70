//! Protocol codec
//!
//! Encoding and decoding functions for request and response bodies. Framing
//! (the 4-byte length prefix) lives in `frame`.
//!
//! ## Wire Format (big-endian throughout)
//!
//! ### Request
//! ```text
//! ┌──────────┬────────┬────────────┬──────┬────────────┬─────────────┬─────────┐
//! │ TxId (8) │ Op (1) │ PathLen (4)│ Path │ Offset (8) │ DataLen (4) │  Data   │
//! └──────────┴────────┴────────────┴──────┴────────────┴─────────────┴─────────┘
//! ```
//! Offset, DataLen and Data may be omitted; missing fields decode as zero/empty.
//!
//! ### Response
//! ```text
//! ┌──────────┬────────────┬─────────┬─────────────┬─────────┐
//! │ TxId (8) │ Status (4) │ LSN (4) │ DataLen (8) │  Data   │
//! └──────────┴────────────┴─────────┴─────────────┴─────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::frame::{read_frame, write_frame};
use super::{Operation, Request, Response, Status};
use crate::error::{MockError, Result};

/// TxId (8) + Op (1) + PathLen (4)
pub const REQUEST_HEADER_SIZE: usize = 13;

/// TxId (8) + Status (4) + LSN (4) + DataLen (8)
pub const RESPONSE_HEADER_SIZE: usize = 24;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request body
///
/// Always writes the full layout, including offset and data length.
pub fn encode_request(request: &Request) -> Result<Bytes> {
    let path = request.path.as_bytes();
    let path_len = u32::try_from(path.len())
        .map_err(|_| MockError::Protocol(format!("path too long: {} bytes", path.len())))?;
    let payload_len = u32::try_from(request.payload.len()).map_err(|_| {
        MockError::Protocol(format!("payload too long: {} bytes", request.payload.len()))
    })?;

    let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + path.len() + 12 + request.payload.len());
    buf.put_u64(request.transaction_id);
    buf.put_u8(request.operation.code());
    buf.put_u32(path_len);
    buf.put_slice(path);
    buf.put_u64(request.offset);
    buf.put_u32(payload_len);
    buf.put_slice(&request.payload);

    Ok(buf.freeze())
}

/// Decode a request body
///
/// Fails only when the fixed header or the path itself is cut short. Invalid
/// UTF-8 in the path is replaced, never rejected.
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    if bytes.len() < REQUEST_HEADER_SIZE {
        return Err(MockError::FrameTooShort {
            needed: REQUEST_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let mut buf = bytes;
    let transaction_id = buf.get_u64();
    let operation = Operation::from_code(buf.get_u8());
    let path_len = buf.get_u32() as usize;

    if buf.remaining() < path_len {
        return Err(MockError::FrameTooShort {
            needed: REQUEST_HEADER_SIZE.saturating_add(path_len),
            available: bytes.len(),
        });
    }
    let path = String::from_utf8_lossy(&buf[..path_len]).into_owned();
    buf.advance(path_len);

    // Lenient tail: short frames from BeginTx/Readdir style callers
    let mut offset = 0;
    let mut payload = Vec::new();
    if buf.remaining() >= 8 {
        offset = buf.get_u64();
        if buf.remaining() >= 4 {
            let payload_len = buf.get_u32() as usize;
            if buf.remaining() >= payload_len {
                payload = buf[..payload_len].to_vec();
            }
        }
    }

    Ok(Request {
        transaction_id,
        operation,
        path,
        offset,
        payload,
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response body
pub fn encode_response(response: &Response) -> Bytes {
    let mut buf = BytesMut::with_capacity(RESPONSE_HEADER_SIZE + response.payload.len());
    buf.put_u64(response.transaction_id);
    buf.put_i32(response.status.code());
    buf.put_u32(response.lsn);
    buf.put_u64(response.payload.len() as u64);
    buf.put_slice(&response.payload);

    buf.freeze()
}

/// Decode a response body
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    if bytes.len() < RESPONSE_HEADER_SIZE {
        return Err(MockError::ResponseTooShort {
            needed: RESPONSE_HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let mut buf = bytes;
    let transaction_id = buf.get_u64();
    let status = Status(buf.get_i32());
    let lsn = buf.get_u32();
    let payload_len = buf.get_u64();

    if (buf.remaining() as u64) < payload_len {
        return Err(MockError::ResponseTooShort {
            needed: RESPONSE_HEADER_SIZE.saturating_add(payload_len as usize),
            available: bytes.len(),
        });
    }
    let payload = buf[..payload_len as usize].to_vec();

    Ok(Response {
        transaction_id,
        status,
        lsn,
        payload,
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read and decode the next request
///
/// Returns `Ok(None)` on a clean end of stream.
pub fn read_request<R: Read>(reader: &mut R, max_frame_size: Option<u32>) -> Result<Option<Request>> {
    match read_frame(reader, max_frame_size)? {
        Some(body) => decode_request(&body).map(Some),
        None => Ok(None),
    }
}

/// Encode and write a request frame
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let body = encode_request(request)?;
    write_frame(writer, &body)
}

/// Read and decode the next response
///
/// Returns `Ok(None)` if the server closed the stream without replying.
pub fn read_response<R: Read>(reader: &mut R) -> Result<Option<Response>> {
    match read_frame(reader, None)? {
        Some(body) => decode_response(&body).map(Some),
        None => Ok(None),
    }
}

/// Encode and write a response frame
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let body = encode_response(response);
    write_frame(writer, &body)
}
