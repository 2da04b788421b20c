//! # Client Binary Entry Point
//!
//! Terminal frontend for the StegoShare embedding workflow: pick a cover
//! image and a payload file, see the capacity, submit, watch the progress
//! bar.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- --config config/client.toml \
//!   --cover photo.png --payload secret.txt --kind text
//! ```
//!
//! The client will:
//! 1. Load configuration from the specified TOML file
//! 2. Decode the cover image header and show the embedding capacity
//! 3. Validate the selection locally (advisory; the server re-checks)
//! 4. Submit the job with retry on transport failure
//! 5. Stream and render embedding progress until completion

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::{error, info, warn, LevelFilter};
use std::io::Write;
use std::path::Path;

// Import from the library crate
use stegoshare::client::coordinator::{decode_cover, inspect_payload};
use stegoshare::client::{ClientCore, RemoteFeed, SubmitOutcome, UiCoordinator};
use stegoshare::client::client::ClientConfig;
use stegoshare::common::config::load_config;
use stegoshare::common::messages::PayloadKind;
use stegoshare::progress::{Phase, ProgressFeed};

/// Width of the rendered progress bar, in characters.
const BAR_WIDTH: usize = 20;

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    ///
    /// Example: config/client.toml
    #[arg(short, long)]
    config: String,

    /// Path to the cover image
    #[arg(long)]
    cover: String,

    /// Path to the payload file to hide
    #[arg(long)]
    payload: String,

    /// Kind of payload: text, image, audio or video
    #[arg(long, default_value = "text")]
    kind: String,
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

/// Render the progress bar, e.g. `[████████░░░░░░░░░░░░] 42%`.
///
/// `None` while the bar is still hidden (no submission started).
fn render_progress(ui: &UiCoordinator) -> Option<String> {
    let filled = ui.progress_fill()? as usize * BAR_WIDTH / 100;
    Some(format!(
        "[{}{}] {}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        ui.progress_label()?
    ))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    init_logger();

    // Parse command-line arguments
    let args = Args::parse();

    // Load client configuration from TOML file
    let config: ClientConfig = load_config(&args.config)?;

    let kind: PayloadKind = args.kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut ui = UiCoordinator::new();
    ui.set_payload_kind(kind);

    // Pick the cover: decode its header and show the capacity
    let token = ui.begin_cover_selection();
    let cover = decode_cover(Path::new(&args.cover)).await?;
    ui.apply_cover_decode(token, cover);

    if let Some(line) = ui.capacity_line() {
        info!("🖼️  {}", line);
    }

    // Pick the payload
    let payload = inspect_payload(Path::new(&args.payload)).await?;
    ui.set_payload(payload);

    // Advisory validation; the same checks run again server-side
    if let Some(message) = ui.validation().message() {
        error!("{}", message);
        return Err(anyhow::anyhow!(message));
    }

    let request = match ui.begin_submission() {
        Some(request) => request,
        None => return Err(anyhow::anyhow!("Nothing to submit")),
    };
    let job_id = request.job_id;

    // Submit and wait for the verdict
    let core = ClientCore::new(config.client.name.clone());
    let outcome = core
        .submit_with_retry(&config.client.server_address, request)
        .await?;

    let conn = match outcome {
        SubmitOutcome::Accepted(conn) => conn,
        SubmitOutcome::Rejected { reason } => {
            error!("{}", reason);
            return Err(anyhow::anyhow!(reason));
        }
    };

    // Stream progress until the server closes the connection
    let feed = RemoteFeed::new();
    let mut rx = feed.subscribe(job_id);
    feed.attach(job_id, conn);

    while let Some(event) = rx.recv().await {
        ui.apply_progress(event);
        if let Some(bar) = render_progress(&ui) {
            info!("{}", bar);
        }
    }

    if ui.progress_state().phase == Phase::Complete {
        info!("✅ Embedding complete");
        Ok(())
    } else {
        ui.mark_feed_lost();
        if let Some(bar) = render_progress(&ui) {
            warn!("⚠️  {}", bar);
        }
        Err(anyhow::anyhow!("Progress feed lost before completion"))
    }
}
