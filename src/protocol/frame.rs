//! Frame transport
//!
//! Reads and writes length-prefixed byte blocks. Knows nothing about what the
//! bytes mean.
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ Length (4)   │  Body (Length bytes)        │
//! └──────────────┴─────────────────────────────┘
//! ```

use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{MockError, Result};

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bound on the up-front allocation for a frame body.
/// Larger bodies grow as bytes actually arrive.
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Read one frame body from a stream
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
/// A stream that ends anywhere inside a frame yields `TruncatedFrame`.
/// A read timeout anywhere (boundary or mid-frame) yields `IdleTimeout`.
pub fn read_frame<R: Read>(reader: &mut R, max_frame_size: Option<u32>) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let received = read_prefix(reader, &mut prefix)?;

    if received == 0 {
        return Ok(None);
    }
    if received < LENGTH_PREFIX_SIZE {
        return Err(MockError::TruncatedFrame {
            expected: LENGTH_PREFIX_SIZE,
            received,
        });
    }

    let body_len = u32::from_be_bytes(prefix);
    if let Some(max) = max_frame_size {
        if body_len > max {
            return Err(MockError::FrameTooLarge {
                size: body_len as usize,
                max: max as usize,
            });
        }
    }

    let body_len = body_len as usize;
    let mut body = Vec::with_capacity(body_len.min(INITIAL_BODY_CAPACITY));
    reader
        .by_ref()
        .take(body_len as u64)
        .read_to_end(&mut body)
        .map_err(map_read_error)?;

    if body.len() < body_len {
        return Err(MockError::TruncatedFrame {
            expected: body_len,
            received: body.len(),
        });
    }

    Ok(Some(body))
}

/// Write one frame (length prefix + body) as a single buffered write
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    let body_len = u32::try_from(body.len()).map_err(|_| MockError::FrameTooLarge {
        size: body.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    frame.put_u32(body_len);
    frame.put_slice(body);

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Fill the prefix buffer, returning how many bytes arrived before EOF
fn read_prefix<R: Read>(reader: &mut R, prefix: &mut [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_read_error(e)),
        }
    }
    Ok(filled)
}

/// Socket read timeouts surface as WouldBlock on Unix and TimedOut on Windows
fn map_read_error(err: std::io::Error) -> MockError {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => MockError::IdleTimeout,
        _ => MockError::Io(err),
    }
}
