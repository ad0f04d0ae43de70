//! TCP Server
//!
//! Accepts connections and hands each one to a `Connection`.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::{AcceptMode, Config};
use crate::error::Result;
use crate::store::TransactionStore;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cloneable handle that stops a running server
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop after the current connection
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for the mock kernel
pub struct Server {
    config: Config,
    store: Arc<TransactionStore>,
    listener: TcpListener,
    shutdown: ShutdownHandle,

    /// Live connection threads (thread-per-connection mode)
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listening socket
    ///
    /// Binding happens here so the bound address (e.g. for port 0) is known
    /// before `run` is called.
    pub fn bind(config: Config, store: Arc<TransactionStore>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Polled accept so a shutdown request is noticed between connections
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            store,
            listener,
            shutdown: ShutdownHandle::default(),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Start the server (blocking until shutdown)
    ///
    /// A connection that fails for any reason is logged and dropped; the
    /// listener keeps accepting.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Ready to accept host clients ({:?} mode)",
            self.config.accept_mode
        );

        let mut conn_count = 0u64;

        while !self.shutdown.is_shutdown() {
            let (stream, peer_addr) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                    continue;
                }
            };

            conn_count += 1;
            tracing::info!("Connection #{} from {}", conn_count, peer_addr);

            // Some platforms hand out accepted sockets in the listener's mode
            if let Err(e) = stream.set_nonblocking(false) {
                tracing::warn!("Connection #{}: could not switch to blocking: {}", conn_count, e);
                continue;
            }

            match self.config.accept_mode {
                AcceptMode::Sequential => {
                    serve_connection(conn_count, stream, &self.store, &self.config);
                }
                AcceptMode::ThreadPerConnection => self.spawn_connection(conn_count, stream),
            }
        }

        tracing::info!("Server stopped after {} connections", conn_count);
        Ok(())
    }

    /// Serve a connection on its own thread, respecting `max_connections`
    fn spawn_connection(&self, id: u64, stream: TcpStream) {
        let active = Arc::clone(&self.active_connections);
        if active.fetch_add(1, Ordering::SeqCst) >= self.config.max_connections {
            active.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(
                "Connection #{} refused: {} connections already open",
                id,
                self.config.max_connections
            );
            return;
        }

        let store = Arc::clone(&self.store);
        let config = self.config.clone();
        let thread_active = Arc::clone(&active);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                serve_connection(id, stream, &store, &config);
                thread_active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            active.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Connection #{}: failed to spawn handler thread: {}", id, e);
        }
    }

    /// Signal the server to stop accepting
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The shared transaction store
    pub fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    /// Connections currently served on their own threads
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}

/// Run one connection to completion and log how it ended
fn serve_connection(id: u64, stream: TcpStream, store: &Arc<TransactionStore>, config: &Config) {
    let mut connection = match Connection::new(stream, Arc::clone(store), config) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Connection #{}: setup failed: {}", id, e);
            return;
        }
    };

    match connection.handle() {
        Ok(summary) => tracing::info!(
            "Connection #{} closed ({}, {} requests)",
            id,
            summary.reason,
            summary.requests
        ),
        Err(e) => tracing::warn!(
            "Connection #{} error after {} requests: {}",
            id,
            connection.requests(),
            e
        ),
    }

    let stats = store.stats();
    tracing::debug!(
        "Store: {} active transactions, {} paths, {} LSNs issued",
        stats.active_transactions,
        stats.registered_paths,
        stats.lsns_issued
    );
}
