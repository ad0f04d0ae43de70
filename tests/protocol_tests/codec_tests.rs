//! Codec Tests
//!
//! Tests for request and response encoding/decoding.

use std::io::Cursor;

use dbfs_mock::protocol::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, Operation, Request, Response, Status,
    REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE,
};
use dbfs_mock::MockError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Hand-build a request body the way the reference host client packs it
fn raw_request(tx_id: u64, op: u8, path: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&tx_id.to_be_bytes());
    bytes.push(op);
    bytes.extend_from_slice(&(path.len() as u32).to_be_bytes());
    bytes.extend_from_slice(path);
    bytes.extend_from_slice(tail);
    bytes
}

fn round_trip(request: &Request) -> Request {
    let encoded = encode_request(request).unwrap();
    decode_request(&encoded).unwrap()
}

// =============================================================================
// Request Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_begin_tx() {
    let request = Request::new(7, Operation::BeginTx);
    assert_eq!(round_trip(&request), request);
}

#[test]
fn test_encode_decode_write_file() {
    let request = Request::write(42, "/data/file.txt", 4096, b"hello world".to_vec());
    let decoded = round_trip(&request);

    assert_eq!(decoded.transaction_id, 42);
    assert_eq!(decoded.operation, Operation::WriteFile);
    assert_eq!(decoded.path, "/data/file.txt");
    assert_eq!(decoded.offset, 4096);
    assert_eq!(decoded.payload, b"hello world");
}

#[test]
fn test_encode_decode_path_operations() {
    for op in [
        Operation::CreateFile,
        Operation::DeleteFile,
        Operation::Mkdir,
        Operation::Readdir,
    ] {
        let request = Request::with_path(u64::MAX, op, "/some/path");
        assert_eq!(round_trip(&request), request);
    }
}

#[test]
fn test_encode_decode_unknown_operation() {
    let request = Request::new(3, Operation::Unknown(0xEE));
    let decoded = round_trip(&request);
    assert_eq!(decoded.operation, Operation::Unknown(0xEE));
}

#[test]
fn test_encode_decode_binary_payload() {
    let payload: Vec<u8> = (0..=255).collect();
    let request = Request::write(0, "", u64::MAX, payload.clone());
    let decoded = round_trip(&request);

    assert!(decoded.path.is_empty());
    assert_eq!(decoded.offset, u64::MAX);
    assert_eq!(decoded.payload, payload);
}

#[test]
fn test_encode_decode_unicode_path() {
    let request = Request::with_path(1, Operation::CreateFile, "/données/日本.txt");
    assert_eq!(round_trip(&request), request);
}

#[test]
fn test_request_byte_layout() {
    let request = Request::write(0x0102030405060708, "/a", 9, vec![0xAA, 0xBB]);
    let encoded = encode_request(&request).unwrap();

    let expected = raw_request(
        0x0102030405060708,
        0x02,
        b"/a",
        &[0, 0, 0, 0, 0, 0, 0, 9, 0, 0, 0, 2, 0xAA, 0xBB],
    );
    assert_eq!(encoded.as_ref(), expected.as_slice());
}

// =============================================================================
// Lenient Decoding Tests
// =============================================================================

#[test]
fn test_decode_header_only() {
    let bytes = raw_request(9, 0x06, b"", &[]);
    assert_eq!(bytes.len(), REQUEST_HEADER_SIZE);

    let request = decode_request(&bytes).unwrap();
    assert_eq!(request.transaction_id, 9);
    assert_eq!(request.operation, Operation::Readdir);
    assert_eq!(request.offset, 0);
    assert!(request.payload.is_empty());
}

#[test]
fn test_decode_partial_offset_defaults_to_zero() {
    // Only 5 of the 8 offset bytes present
    let bytes = raw_request(1, 0x03, b"/f", &[0, 0, 0, 0, 1]);
    let request = decode_request(&bytes).unwrap();

    assert_eq!(request.path, "/f");
    assert_eq!(request.offset, 0);
    assert!(request.payload.is_empty());
}

#[test]
fn test_decode_missing_payload_length() {
    let bytes = raw_request(1, 0x02, b"/f", &[0, 0, 0, 0, 0, 0, 0, 5, 0, 0]);
    let request = decode_request(&bytes).unwrap();

    assert_eq!(request.offset, 5);
    assert!(request.payload.is_empty());
}

#[test]
fn test_decode_payload_shorter_than_declared() {
    // Declares 10 payload bytes, supplies 3
    let bytes = raw_request(1, 0x02, b"/f", &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 1, 2, 3]);
    let request = decode_request(&bytes).unwrap();

    assert_eq!(request.offset, 0);
    assert!(request.payload.is_empty());
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    let bytes = raw_request(1, 0x02, b"/f", &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 7, 8, 99, 99]);
    let request = decode_request(&bytes).unwrap();
    assert_eq!(request.payload, vec![7, 8]);
}

#[test]
fn test_decode_invalid_utf8_path_is_substituted() {
    let bytes = raw_request(1, 0x03, &[b'/', 0xFF, b'x'], &[]);
    let request = decode_request(&bytes).unwrap();
    assert_eq!(request.path, "/\u{FFFD}x");
}

// =============================================================================
// Request Error Handling Tests
// =============================================================================

#[test]
fn test_decode_frame_too_short() {
    let bytes = [0u8; 12];
    let result = decode_request(&bytes);
    assert!(matches!(
        result,
        Err(MockError::FrameTooShort { needed: 13, available: 12 })
    ));
}

#[test]
fn test_decode_empty_frame() {
    let result = decode_request(&[]);
    assert!(matches!(result, Err(MockError::FrameTooShort { .. })));
}

#[test]
fn test_decode_path_overruns_frame() {
    let mut bytes = raw_request(1, 0x03, b"/abc", &[]);
    // Claim a longer path than what follows
    bytes[9..13].copy_from_slice(&10u32.to_be_bytes());

    let result = decode_request(&bytes);
    assert!(matches!(result, Err(MockError::FrameTooShort { .. })));
}

#[test]
fn test_decode_huge_path_length() {
    let mut bytes = raw_request(1, 0x03, b"", &[]);
    bytes[9..13].copy_from_slice(&u32::MAX.to_be_bytes());

    let result = decode_request(&bytes);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("too short"));
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_ok() {
    let response = Response::ok(7, 1, Vec::new());
    let encoded = encode_response(&response);

    assert_eq!(encoded.len(), RESPONSE_HEADER_SIZE);
    assert_eq!(decode_response(&encoded).unwrap(), response);
}

#[test]
fn test_encode_decode_response_with_payload() {
    let response = Response::ok(12345, 0, br#"["/a", "/b"]"#.to_vec());
    let encoded = encode_response(&response);

    assert_eq!(encoded.len(), RESPONSE_HEADER_SIZE + 12);
    assert_eq!(decode_response(&encoded).unwrap(), response);
}

#[test]
fn test_encode_decode_response_protocol_error() {
    let response = Response::protocol_error();
    let decoded = decode_response(&encode_response(&response)).unwrap();

    assert_eq!(decoded.transaction_id, 0);
    assert_eq!(decoded.status, Status::PROTOCOL_ERROR);
    assert_eq!(decoded.status.code(), -1);
    assert_eq!(decoded.lsn, 0);
    assert!(decoded.payload.is_empty());
}

#[test]
fn test_encode_decode_extreme_status_values() {
    for code in [i32::MIN, -2, 1, i32::MAX] {
        let response = Response {
            transaction_id: 1,
            status: Status(code),
            lsn: u32::MAX,
            payload: Vec::new(),
        };
        assert_eq!(decode_response(&encode_response(&response)).unwrap(), response);
    }
}

#[test]
fn test_response_byte_layout() {
    let response = Response {
        transaction_id: 7,
        status: Status::PROTOCOL_ERROR,
        lsn: 3,
        payload: b"ab".to_vec(),
    };
    let encoded = encode_response(&response);

    let mut expected = Vec::new();
    expected.extend_from_slice(&7u64.to_be_bytes());
    expected.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
    expected.extend_from_slice(&3u32.to_be_bytes());
    expected.extend_from_slice(&2u64.to_be_bytes());
    expected.extend_from_slice(b"ab");

    assert_eq!(encoded.as_ref(), expected.as_slice());
}

#[test]
fn test_decode_response_too_short() {
    let result = decode_response(&[0u8; 23]);
    assert!(matches!(
        result,
        Err(MockError::ResponseTooShort { needed: 24, available: 23 })
    ));
}

#[test]
fn test_decode_response_truncated_payload() {
    let mut encoded = encode_response(&Response::ok(1, 0, b"hello".to_vec())).to_vec();
    encoded.truncate(encoded.len() - 2);

    let result = decode_response(&encoded);
    assert!(matches!(result, Err(MockError::ResponseTooShort { .. })));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_request_round_trip() {
    let mut wire = Vec::new();
    write_request(&mut wire, &Request::new(1, Operation::BeginTx)).unwrap();
    write_request(&mut wire, &Request::with_path(1, Operation::CreateFile, "/x")).unwrap();

    let mut reader = Cursor::new(wire);
    let first = read_request(&mut reader, None).unwrap().unwrap();
    let second = read_request(&mut reader, None).unwrap().unwrap();

    assert_eq!(first.operation, Operation::BeginTx);
    assert_eq!(second.path, "/x");
    assert!(read_request(&mut reader, None).unwrap().is_none());
}

#[test]
fn test_stream_response_round_trip() {
    let response = Response::ok(5, 9, Vec::new());

    let mut wire = Vec::new();
    write_response(&mut wire, &response).unwrap();
    assert_eq!(&wire[..4], &(RESPONSE_HEADER_SIZE as u32).to_be_bytes());

    let mut reader = Cursor::new(wire);
    assert_eq!(read_response(&mut reader).unwrap(), Some(response));
    assert_eq!(read_response(&mut reader).unwrap(), None);
}

#[test]
fn test_stream_short_request_frame() {
    // A 5-byte frame is well-formed framing but not a valid request
    let mut wire = Vec::new();
    wire.extend_from_slice(&5u32.to_be_bytes());
    wire.extend_from_slice(&[1, 2, 3, 4, 5]);

    let result = read_request(&mut Cursor::new(wire), None);
    assert!(matches!(result, Err(MockError::FrameTooShort { .. })));
}
