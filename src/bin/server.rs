//! # Server Binary Entry Point
//!
//! Thin wrapper that initializes and runs the StegoShare embedding server.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! ```
//!
//! The server will:
//! 1. Load configuration from the specified TOML file
//! 2. Bind the configured address
//! 3. Accept job submissions, enforce validation, and stream progress

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

// Import from the library crate
use stegoshare::common::config::load_config;
use stegoshare::server::{Server, ServerConfig};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    ///
    /// Example: config/server.toml
    #[arg(short, long)]
    config: String,
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Logs are printed to stdout with INFO level by default.
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logger();

    // Parse command-line arguments
    let args = Args::parse();

    // Load server configuration from TOML file
    let config: ServerConfig = load_config(&args.config)?;

    // Bind and run the server (runs indefinitely until error or shutdown)
    let server = Server::bind(config).await?;
    server.run().await
}
