//! # Embedding Job Runner
//!
//! Drives the progress contract for one accepted job: scan the cover image
//! row by row and push a `ProgressUpdate` whenever the completion percentage
//! advances, finishing with an exact 100.
//!
//! The LSB bit-twiddling itself lives in the embedding engine, outside this
//! service; the runner paces a row scan over the submitted dimensions so the
//! progress stream behaves exactly as the real pass does: percentages derived
//! from rows processed out of total rows, duplicates suppressed, terminal 100
//! guaranteed.

use anyhow::Result;
use log::info;
use std::time::Duration;
use tokio::time::sleep;

use crate::capacity::CoverImage;
use crate::common::connection::Connection;
use crate::common::messages::{JobId, Message, PayloadKind};

/// One accepted embedding job.
pub struct EmbedJob {
    /// Client-chosen identifier
    pub job_id: JobId,
    /// Submitting client, for logging
    pub client_name: String,
    /// Cover image the scan walks over
    pub cover: CoverImage,
    /// Payload size, for logging
    pub payload_size_bytes: u64,
    /// Payload kind, for logging
    pub payload_kind: PayloadKind,
}

/// Percentage of the scan completed after `row` of `rows` rows.
fn row_percent(row: u32, rows: u32) -> u8 {
    ((row as u64 * 100) / rows as u64) as u8
}

/// Run one job, streaming progress over the submission connection.
///
/// # Arguments
/// - `job`: The accepted job to run
/// - `row_delay_ms`: Pacing delay per scanned row
/// - `conn`: The connection the job was submitted on; updates are pushed here
///
/// # Returns
/// - `Ok(())`: The job ran to completion and 100 was sent
/// - `Err`: Writing an update failed (client went away)
///
/// # Progress Contract
/// Updates carry the percentage of rows processed. Consecutive rows that map
/// to the same percentage produce a single update; the final update is always
/// exactly 100. A zero-row cover completes immediately with a single 100.
pub async fn run_job(job: &EmbedJob, row_delay_ms: u64, conn: &mut Connection) -> Result<()> {
    info!(
        "📷 Embedding job #{} from '{}': {} bytes of {} into {}x{} cover",
        job.job_id,
        job.client_name,
        job.payload_size_bytes,
        job.payload_kind,
        job.cover.width_px,
        job.cover.height_px
    );

    let rows = job.cover.height_px;

    if rows == 0 {
        // Nothing to scan; the job is trivially done.
        conn.write_message(&Message::ProgressUpdate { progress: 100 })
            .await?;
        info!("✅ Completed job #{} (empty cover)", job.job_id);
        return Ok(());
    }

    let mut last_percent = None;
    for row in 1..=rows {
        sleep(Duration::from_millis(row_delay_ms)).await;

        let percent = row_percent(row, rows);
        if last_percent != Some(percent) {
            conn.write_message(&Message::ProgressUpdate { progress: percent })
                .await?;
            last_percent = Some(percent);
        }
    }

    info!("✅ Completed job #{}", job.job_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_row_percent_is_monotonic_and_ends_at_100() {
        for rows in [1u32, 4, 7, 100, 357] {
            let mut previous = 0;
            for row in 1..=rows {
                let percent = row_percent(row, rows);
                assert!(percent >= previous);
                assert!(percent <= 100);
                previous = percent;
            }
            assert_eq!(row_percent(rows, rows), 100);
        }
    }

    #[test]
    fn test_four_rows_quarter_steps() {
        let percents: Vec<u8> = (1..=4).map(|row| row_percent(row, 4)).collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
    }

    async fn collect_stream(job: EmbedJob) -> Vec<u8> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut conn = Connection::new(socket);
            run_job(&job, 1, &mut conn).await.unwrap();
        });

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut conn = Connection::new(stream);

        let mut seen = Vec::new();
        while let Some(msg) = conn.read_message().await.unwrap() {
            match msg {
                Message::ProgressUpdate { progress } => seen.push(progress),
                other => panic!("unexpected message: {:?}", other),
            }
        }
        seen
    }

    fn job_with_height(height_px: u32) -> EmbedJob {
        EmbedJob {
            job_id: 1,
            client_name: "test".to_string(),
            cover: CoverImage {
                width_px: 8,
                height_px,
                size_bytes: 2048,
            },
            payload_size_bytes: 10,
            payload_kind: PayloadKind::Text,
        }
    }

    #[tokio::test]
    async fn test_streams_deduplicated_percents_ending_at_100() {
        let seen = collect_stream(job_with_height(4)).await;
        assert_eq!(seen, vec![25, 50, 75, 100]);
    }

    #[tokio::test]
    async fn test_zero_row_cover_completes_immediately() {
        let seen = collect_stream(job_with_height(0)).await;
        assert_eq!(seen, vec![100]);
    }
}
