//! Network Module
//!
//! TCP listener and per-connection handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - Sequential connections by default, optionally one thread per connection
//! - Requests routed through the shared `TransactionStore`

mod connection;
mod server;

pub use connection::{CloseReason, Connection, ConnectionSummary};
pub use server::{Server, ShutdownHandle};
