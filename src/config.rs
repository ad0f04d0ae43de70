//! Configuration for the mock kernel server
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{MockError, Result};

/// Default TCP port the host client expects
pub const DEFAULT_PORT: u16 = 12345;

/// Main configuration for a mock kernel server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// How accepted connections are scheduled
    pub accept_mode: AcceptMode,

    /// Max concurrent client connections (thread-per-connection mode only)
    pub max_connections: usize,

    /// Idle read timeout (milliseconds, 0 = wait forever)
    pub idle_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Optional ceiling on a single frame's declared length.
    ///
    /// `None` accepts anything the 32-bit length prefix can express. Setting a
    /// ceiling is a protocol extension: oversized frames are answered with an
    /// error response and the connection is closed.
    pub max_frame_size: Option<u32>,
}

/// Connection scheduling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptMode {
    /// Serve one connection to completion before accepting the next
    Sequential,

    /// Spawn one thread per accepted connection
    ThreadPerConnection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            accept_mode: AcceptMode::Sequential,
            max_connections: 64,
            idle_timeout_ms: 60_000,
            write_timeout_ms: 5_000,
            max_frame_size: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        self.listen_addr.parse::<SocketAddr>().map_err(|e| {
            MockError::Config(format!("invalid listen address '{}': {}", self.listen_addr, e))
        })?;

        if self.max_connections == 0 {
            return Err(MockError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Idle read timeout as a socket option value
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    /// Write timeout as a socket option value
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the connection scheduling strategy
    pub fn accept_mode(mut self, mode: AcceptMode) -> Self {
        self.config.accept_mode = mode;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the idle read timeout (in milliseconds)
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the frame size ceiling
    pub fn max_frame_size(mut self, max: Option<u32>) -> Self {
        self.config.max_frame_size = max;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
