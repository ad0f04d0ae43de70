//! # dbfs-mock
//!
//! A stand-in for the transactional-filesystem kernel that host clients talk
//! to over a length-prefixed binary protocol:
//! - Frame transport with 4-byte big-endian length prefixes
//! - Request/response codec for the DBFS operation set
//! - Permissive in-memory transaction store with monotonically increasing LSNs
//! - Sequential (or thread-per-connection) TCP server with idle timeouts
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (accepts, one connection at a time)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection Handler                          │
//! │     AwaitFrame → Decoding → Dispatching → Encoding           │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌──────────────────┐
//!   │ Frame + Codec   │                │ TransactionStore │
//!   │  (protocol)     │                │  (one Mutex)     │
//!   └─────────────────┘                └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::DbfsClient;
pub use config::{AcceptMode, Config};
pub use error::{MockError, Result};
pub use network::Server;
pub use store::TransactionStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dbfs-mock
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
