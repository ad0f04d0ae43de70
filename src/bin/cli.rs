//! DBFS Host CLI
//!
//! Command-line client for poking a kernel server by hand.

use std::time::Duration;

use clap::{Parser, Subcommand};
use dbfs_mock::protocol::Response;
use dbfs_mock::{DbfsClient, Result};

/// DBFS host client
#[derive(Parser, Debug)]
#[command(name = "dbfs-mock-cli")]
#[command(about = "CLI for the DBFS kernel protocol")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Seconds to wait for each response
    #[arg(short, long, default_value = "5")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a transaction
    Begin {
        tx: u64,
    },

    /// Commit a transaction
    Commit {
        tx: u64,
    },

    /// Roll back a transaction
    Rollback {
        tx: u64,
    },

    /// Create a file
    Create {
        tx: u64,
        path: String,
    },

    /// Delete a file
    Delete {
        tx: u64,
        path: String,
    },

    /// Create a directory
    Mkdir {
        tx: u64,
        path: String,
    },

    /// Write data to a file
    Write {
        tx: u64,
        path: String,

        /// The text to write
        data: String,

        #[arg(short, long, default_value = "0")]
        offset: u64,
    },

    /// List registered paths
    Readdir {
        tx: u64,

        #[arg(default_value = "/")]
        path: String,
    },

    /// Begin, create a file, commit, then list
    Scenario {
        #[arg(default_value = "7")]
        tx: u64,

        #[arg(default_value = "/x")]
        path: String,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let timeout = Duration::from_secs(args.timeout_secs);
    let mut client = DbfsClient::connect(args.server.as_str(), Some(timeout))?;

    let response = match args.command {
        Commands::Begin { tx } => client.begin_tx(tx)?,
        Commands::Commit { tx } => client.commit_tx(tx)?,
        Commands::Rollback { tx } => client.rollback_tx(tx)?,
        Commands::Create { tx, path } => client.create_file(tx, &path)?,
        Commands::Delete { tx, path } => client.delete_file(tx, &path)?,
        Commands::Mkdir { tx, path } => client.mkdir(tx, &path)?,
        Commands::Write { tx, path, data, offset } => {
            client.write_file(tx, &path, offset, data.as_bytes())?
        }
        Commands::Readdir { tx, path } => client.readdir(tx, &path)?,
        Commands::Scenario { tx, path } => {
            print_response("begin", &client.begin_tx(tx)?);
            print_response("create", &client.create_file(tx, &path)?);
            print_response("commit", &client.commit_tx(tx)?);

            let listing = client.readdir_paths(tx.wrapping_add(1), "/")?;
            println!("readdir: {:?}", listing);
            return Ok(());
        }
    };

    print_response("response", &response);
    Ok(())
}

fn print_response(label: &str, response: &Response) {
    print!(
        "{}: tx={} status={} lsn={}",
        label, response.transaction_id, response.status, response.lsn
    );
    if response.payload.is_empty() {
        println!();
    } else {
        println!(" data={}", String::from_utf8_lossy(&response.payload));
    }
}
