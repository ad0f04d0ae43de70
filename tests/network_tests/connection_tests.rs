//! Connection Handler Tests
//!
//! Drives a single `Connection` over a loopback socket and checks what the
//! client observes on the wire.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dbfs_mock::network::{CloseReason, Connection, ConnectionSummary};
use dbfs_mock::protocol::{
    read_response, write_frame, write_request, Operation, Request, Response, Status,
};
use dbfs_mock::{Config, Result, TransactionStore};

// =============================================================================
// Helper Functions
// =============================================================================

/// Accept one connection and run a handler on it
fn spawn_handler(
    config: Config,
    store: Arc<TransactionStore>,
) -> (SocketAddr, JoinHandle<Result<ConnectionSummary>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept()?;
        let mut connection = Connection::new(stream, store, &config)?;
        connection.handle()
    });

    (addr, handle)
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

fn call(stream: &mut TcpStream, request: &Request) -> Response {
    write_request(stream, request).unwrap();
    read_response(stream).unwrap().expect("server closed without responding")
}

/// Read whatever the server still sends until it closes
fn drain(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    rest
}

// =============================================================================
// Request Cycle Tests
// =============================================================================

#[test]
fn test_single_request_then_end_of_stream() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), Arc::clone(&store));

    let mut stream = connect(addr);
    let response = call(&mut stream, &Request::new(7, Operation::BeginTx));
    assert_eq!(response, Response::ok(7, 1, Vec::new()));
    drop(stream);

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.reason, CloseReason::EndOfStream);
    assert!(store.active_transaction(7).is_some());
}

#[test]
fn test_many_requests_on_one_connection() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), Arc::clone(&store));

    let mut stream = connect(addr);
    assert_eq!(call(&mut stream, &Request::new(7, Operation::BeginTx)).lsn, 1);

    let create = call(&mut stream, &Request::with_path(7, Operation::CreateFile, "/x"));
    assert_eq!(create, Response::ok(7, 0, Vec::new()));

    assert_eq!(call(&mut stream, &Request::new(7, Operation::CommitTx)).lsn, 1);

    let listing = call(&mut stream, &Request::with_path(8, Operation::Readdir, "/"));
    assert_eq!(listing.transaction_id, 8);
    assert_eq!(listing.payload, br#"["/x"]"#.to_vec());
    drop(stream);

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.requests, 4);
}

#[test]
fn test_pipelined_requests_answered_in_order() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), store);

    let mut stream = connect(addr);
    let mut batch = Vec::new();
    write_request(&mut batch, &Request::new(1, Operation::BeginTx)).unwrap();
    write_request(&mut batch, &Request::new(2, Operation::BeginTx)).unwrap();
    write_request(&mut batch, &Request::new(1, Operation::CommitTx)).unwrap();
    stream.write_all(&batch).unwrap();

    let answers: Vec<(u64, u32)> = (0..3)
        .map(|_| {
            let r = read_response(&mut stream).unwrap().unwrap();
            (r.transaction_id, r.lsn)
        })
        .collect();
    assert_eq!(answers, vec![(1, 1), (2, 2), (1, 1)]);

    drop(stream);
    assert_eq!(handle.join().unwrap().unwrap().requests, 3);
}

#[test]
fn test_unknown_operation_acknowledged() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), store);

    let mut stream = connect(addr);
    let response = call(&mut stream, &Request::new(5, Operation::Unknown(99)));
    assert_eq!(response, Response::ok(5, 0, Vec::new()));

    // Connection stays usable afterwards
    assert_eq!(call(&mut stream, &Request::new(5, Operation::BeginTx)).lsn, 1);
    drop(stream);
    handle.join().unwrap().unwrap();
}

#[test]
fn test_short_begin_frame_is_accepted() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), store);

    let mut stream = connect(addr);
    // Header only: tx_id + op + zero path length, no offset/payload fields
    let mut body = Vec::new();
    body.extend_from_slice(&3u64.to_be_bytes());
    body.push(0x01);
    body.extend_from_slice(&0u32.to_be_bytes());
    write_frame(&mut stream, &body).unwrap();

    let response = read_response(&mut stream).unwrap().unwrap();
    assert_eq!(response, Response::ok(3, 1, Vec::new()));
    drop(stream);
    handle.join().unwrap().unwrap();
}

// =============================================================================
// Error Path Tests
// =============================================================================

#[test]
fn test_malformed_frame_gets_error_response_then_close() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), store);

    let mut stream = connect(addr);
    write_frame(&mut stream, &[1, 2, 3, 4, 5]).unwrap();

    let response = read_response(&mut stream).unwrap().unwrap();
    assert_eq!(response.transaction_id, 0);
    assert_eq!(response.status, Status::PROTOCOL_ERROR);
    assert_eq!(response.lsn, 0);
    assert!(response.payload.is_empty());

    // Nothing more, the server closed
    assert!(read_response(&mut stream).unwrap().is_none());

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::ProtocolError);
    assert_eq!(summary.requests, 0);
}

#[test]
fn test_malformed_frame_after_good_requests() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), Arc::clone(&store));

    let mut stream = connect(addr);
    call(&mut stream, &Request::new(1, Operation::BeginTx));
    write_frame(&mut stream, &[0u8; 4]).unwrap();

    let response = read_response(&mut stream).unwrap().unwrap();
    assert_eq!(response.status.code(), -1);

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.reason, CloseReason::ProtocolError);
}

#[test]
fn test_truncated_frame_gets_no_response() {
    let store = Arc::new(TransactionStore::new());
    let (addr, handle) = spawn_handler(Config::default(), store);

    let mut stream = connect(addr);
    // Declare 100 bytes, send 10, then stop sending
    stream.write_all(&100u32.to_be_bytes()).unwrap();
    stream.write_all(&[0u8; 10]).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    assert!(drain(&mut stream).is_empty());

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::Truncated);
    assert_eq!(summary.requests, 0);
}

#[test]
fn test_oversized_frame_rejected_with_ceiling() {
    let store = Arc::new(TransactionStore::new());
    let config = Config::builder().max_frame_size(Some(64)).build();
    let (addr, handle) = spawn_handler(config, store);

    let mut stream = connect(addr);
    stream.write_all(&65u32.to_be_bytes()).unwrap();

    let response = read_response(&mut stream).unwrap().unwrap();
    assert_eq!(response, Response::protocol_error());

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::ProtocolError);
}

// =============================================================================
// Idle Timeout Tests
// =============================================================================

#[test]
fn test_idle_timeout_closes_silently() {
    let store = Arc::new(TransactionStore::new());
    let config = Config::builder().idle_timeout_ms(150).build();
    let (addr, handle) = spawn_handler(config, store);

    let mut stream = connect(addr);
    let started = Instant::now();

    assert!(drain(&mut stream).is_empty());
    assert!(started.elapsed() >= Duration::from_millis(100));

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::IdleTimeout);
}

#[test]
fn test_idle_timeout_after_request() {
    let store = Arc::new(TransactionStore::new());
    let config = Config::builder().idle_timeout_ms(150).build();
    let (addr, handle) = spawn_handler(config, store);

    let mut stream = connect(addr);
    assert_eq!(call(&mut stream, &Request::new(1, Operation::BeginTx)).lsn, 1);
    assert!(drain(&mut stream).is_empty());

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.reason, CloseReason::IdleTimeout);
}

#[test]
fn test_stalled_payload_times_out() {
    let store = Arc::new(TransactionStore::new());
    let config = Config::builder().idle_timeout_ms(150).build();
    let (addr, handle) = spawn_handler(config, store);

    let mut stream = connect(addr);
    // Half a frame, then silence with the connection left open
    stream.write_all(&100u32.to_be_bytes()).unwrap();
    stream.write_all(&[0u8; 10]).unwrap();

    assert!(drain(&mut stream).is_empty());

    let summary = handle.join().unwrap().unwrap();
    assert_eq!(summary.reason, CloseReason::IdleTimeout);
}
