//! Mock Kernel Server Binary
//!
//! Starts the TCP server that host clients run their DBFS tests against.

use std::sync::Arc;

use clap::Parser;
use dbfs_mock::config::DEFAULT_PORT;
use dbfs_mock::{AcceptMode, Config, Server, TransactionStore};
use tracing_subscriber::{fmt, EnvFilter};

/// Mock DBFS kernel server
#[derive(Parser, Debug)]
#[command(name = "dbfs-mock-server")]
#[command(about = "Mock transactional-filesystem kernel for host protocol tests")]
#[command(version)]
struct Args {
    /// TCP port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Interface to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Close a connection after this many idle seconds (0 = never)
    #[arg(long, default_value = "60")]
    idle_timeout_secs: u64,

    /// Reject frames whose declared length exceeds this (protocol extension)
    #[arg(long)]
    max_frame_bytes: Option<u32>,

    /// Serve each connection on its own thread instead of one at a time
    #[arg(long)]
    concurrent: bool,

    /// Maximum simultaneous connections with --concurrent
    #[arg(short, long, default_value = "64")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dbfs_mock=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let accept_mode = if args.concurrent {
        AcceptMode::ThreadPerConnection
    } else {
        AcceptMode::Sequential
    };

    tracing::info!("dbfs-mock server v{}", dbfs_mock::VERSION);
    tracing::info!("Port: {}", args.port);
    tracing::info!("Protocol: length-prefixed binary");

    // Build config from args
    let config = Config::builder()
        .listen_addr(format!("{}:{}", args.bind, args.port))
        .accept_mode(accept_mode)
        .max_connections(args.max_connections)
        .idle_timeout_ms(args.idle_timeout_secs.saturating_mul(1000))
        .max_frame_size(args.max_frame_bytes)
        .build();

    let store = Arc::new(TransactionStore::new());

    let server = match Server::bind(config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
