//! Host client
//!
//! Speaks the kernel protocol from the host side: one request frame out, one
//! response frame back.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{MockError, Result};
use crate::protocol::{read_response, write_request, Operation, Request, Response};
use crate::store::DirListing;

/// Blocking client for a mock (or real) kernel server
pub struct DbfsClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl DbfsClient {
    /// Connect to a kernel server
    ///
    /// `read_timeout` bounds how long a call waits for its response.
    pub fn connect(addr: impl ToSocketAddrs, read_timeout: Option<Duration>) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(read_timeout)?;

        tracing::debug!("Connected to kernel at {}", stream.peer_addr()?);

        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);

        Ok(Self { reader, writer })
    }

    /// Send a request and wait for its response
    ///
    /// A server that closes the connection without answering is reported as
    /// `UnexpectedEof`.
    pub fn call(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;

        read_response(&mut self.reader)?.ok_or_else(|| {
            MockError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "server closed the connection without responding",
            ))
        })
    }

    // =========================================================================
    // DBFS Operations
    // =========================================================================

    pub fn begin_tx(&mut self, tx_id: u64) -> Result<Response> {
        self.call(&Request::new(tx_id, Operation::BeginTx))
    }

    pub fn write_file(&mut self, tx_id: u64, path: &str, offset: u64, data: &[u8]) -> Result<Response> {
        self.call(&Request::write(tx_id, path, offset, data.to_vec()))
    }

    pub fn create_file(&mut self, tx_id: u64, path: &str) -> Result<Response> {
        self.call(&Request::with_path(tx_id, Operation::CreateFile, path))
    }

    pub fn delete_file(&mut self, tx_id: u64, path: &str) -> Result<Response> {
        self.call(&Request::with_path(tx_id, Operation::DeleteFile, path))
    }

    pub fn mkdir(&mut self, tx_id: u64, path: &str) -> Result<Response> {
        self.call(&Request::with_path(tx_id, Operation::Mkdir, path))
    }

    pub fn readdir(&mut self, tx_id: u64, path: &str) -> Result<Response> {
        self.call(&Request::with_path(tx_id, Operation::Readdir, path))
    }

    /// Readdir, parsed into the listed paths
    pub fn readdir_paths(&mut self, tx_id: u64, path: &str) -> Result<Vec<String>> {
        let response = self.readdir(tx_id, path)?;
        if !response.status.is_ok() {
            return Err(MockError::Protocol(format!(
                "readdir failed with status {}",
                response.status
            )));
        }
        Ok(DirListing::from_json(&response.payload)?.into_paths())
    }

    pub fn commit_tx(&mut self, tx_id: u64) -> Result<Response> {
        self.call(&Request::new(tx_id, Operation::CommitTx))
    }

    pub fn rollback_tx(&mut self, tx_id: u64) -> Result<Response> {
        self.call(&Request::new(tx_id, Operation::RollbackTx))
    }
}
