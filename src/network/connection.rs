//! Connection Handler
//!
//! Drives one client connection from first frame to close.
//!
//! ```text
//!   ┌────────────┐ frame  ┌──────────┐ request ┌─────────────┐ response ┌──────────┐
//!   │ AwaitFrame │───────>│ Decoding │────────>│ Dispatching │─────────>│ Encoding │
//!   └────────────┘        └──────────┘         └─────────────┘          └──────────┘
//!        ▲  │ EOF / timeout / truncated   │ malformed                         │
//!        │  ▼                             ▼                                   │
//!        │ Closed <──────────── error response, Closed                        │
//!        └────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{MockError, Result};
use crate::protocol::{decode_request, read_frame, write_response, Request, Response};
use crate::store::TransactionStore;

/// Where a connection is in its request cycle
enum ConnectionState {
    /// Waiting for the next length-prefixed frame
    AwaitFrame,

    /// A full frame body arrived
    Decoding(Vec<u8>),

    /// A request is ready for the store
    Dispatching(Request),

    /// A reply is ready to go out
    Encoding(Response),

    Closed(CloseReason),
}

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Client closed cleanly on a frame boundary
    EndOfStream,

    /// Nothing arrived within the idle timeout; no response sent
    IdleTimeout,

    /// Client closed partway through a frame; no response sent
    Truncated,

    /// Malformed frame; one error response sent
    ProtocolError,

    /// Client reset or aborted the connection
    PeerReset,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CloseReason::EndOfStream => "end of stream",
            CloseReason::IdleTimeout => "idle timeout",
            CloseReason::Truncated => "truncated frame",
            CloseReason::ProtocolError => "protocol error",
            CloseReason::PeerReset => "peer reset",
        };
        f.write_str(text)
    }
}

/// What happened on a finished connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Requests decoded and answered
    pub requests: u64,

    pub reason: CloseReason,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared transaction store
    store: Arc<TransactionStore>,

    /// Frame ceiling, if configured
    max_frame_size: Option<u32>,

    /// Peer address for logging
    peer_addr: String,

    requests: u64,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and applies the configured timeouts
    pub fn new(stream: TcpStream, store: Arc<TransactionStore>, config: &Config) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Replies are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        let mut connection = Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            max_frame_size: config.max_frame_size,
            peer_addr,
            requests: 0,
        };
        connection.set_timeouts(config.idle_timeout(), config.write_timeout())?;

        Ok(connection)
    }

    /// Configure connection timeouts (`None` waits forever)
    ///
    /// The read timeout applies to every read, so a payload that stalls
    /// mid-frame is cut off as well as an idle frame boundary.
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Answers requests strictly in arrival order. Returns when the client
    /// disconnects, goes idle, or sends a frame that cannot be decoded.
    /// Only unexpected I/O failures come back as `Err`.
    pub fn handle(&mut self) -> Result<ConnectionSummary> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let mut state = ConnectionState::AwaitFrame;
        let reason = loop {
            state = match state {
                ConnectionState::AwaitFrame => self.await_frame()?,
                ConnectionState::Decoding(body) => self.decode(&body),
                ConnectionState::Dispatching(request) => self.dispatch(request),
                ConnectionState::Encoding(response) => self.send(&response)?,
                ConnectionState::Closed(reason) => break reason,
            };
        };

        tracing::debug!(
            "Connection from {} finished: {} after {} requests",
            self.peer_addr,
            reason,
            self.requests
        );

        Ok(ConnectionSummary {
            requests: self.requests,
            reason,
        })
    }

    fn await_frame(&mut self) -> Result<ConnectionState> {
        match read_frame(&mut self.reader, self.max_frame_size) {
            Ok(Some(body)) => {
                tracing::debug!("Received {} byte frame from {}", body.len(), self.peer_addr);
                Ok(ConnectionState::Decoding(body))
            }
            Ok(None) => {
                tracing::debug!("Client {} disconnected", self.peer_addr);
                Ok(ConnectionState::Closed(CloseReason::EndOfStream))
            }
            Err(MockError::IdleTimeout) => {
                tracing::debug!("Read timeout for client {}", self.peer_addr);
                Ok(ConnectionState::Closed(CloseReason::IdleTimeout))
            }
            Err(e @ MockError::TruncatedFrame { .. }) => {
                tracing::warn!("Client {} closed mid-frame: {}", self.peer_addr, e);
                Ok(ConnectionState::Closed(CloseReason::Truncated))
            }
            Err(e) if e.is_malformed_frame() => Ok(self.reject(&e)),
            Err(e) if e.is_disconnect() => {
                tracing::debug!("Connection reset by client {}: {}", self.peer_addr, e);
                Ok(ConnectionState::Closed(CloseReason::PeerReset))
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    fn decode(&mut self, body: &[u8]) -> ConnectionState {
        match decode_request(body) {
            Ok(request) => {
                self.requests += 1;
                tracing::trace!("Request #{} from {}: {:?}", self.requests, self.peer_addr, request);
                tracing::debug!("TX-{}: {}", request.transaction_id, request.operation);
                ConnectionState::Dispatching(request)
            }
            Err(e) => self.reject(&e),
        }
    }

    fn dispatch(&self, request: Request) -> ConnectionState {
        let result = self.store.execute(&request);
        ConnectionState::Encoding(result.into_response(request.transaction_id))
    }

    fn send(&mut self, response: &Response) -> Result<ConnectionState> {
        match write_response(&mut self.writer, response) {
            Ok(()) => {
                tracing::debug!(
                    "Sent response to {} (status={}, lsn={}, {} byte payload)",
                    self.peer_addr,
                    response.status,
                    response.lsn,
                    response.payload.len()
                );
                Ok(ConnectionState::AwaitFrame)
            }
            // The client went away before we could answer
            Err(e) if e.is_disconnect() => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
                Ok(ConnectionState::Closed(CloseReason::PeerReset))
            }
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Send the single best-effort error response and close
    ///
    /// The stream is not resynchronized after a malformed frame.
    fn reject(&mut self, error: &MockError) -> ConnectionState {
        tracing::warn!("Malformed frame from {}: {}", self.peer_addr, error);

        if let Err(e) = write_response(&mut self.writer, &Response::protocol_error()) {
            tracing::debug!("Could not deliver error response to {}: {}", self.peer_addr, e);
        }
        ConnectionState::Closed(CloseReason::ProtocolError)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Requests answered so far
    pub fn requests(&self) -> u64 {
        self.requests
    }
}
