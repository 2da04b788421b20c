//! # Client Core
//!
//! This module contains the minimal core client implementation that submits
//! embedding jobs to the server and hands back the progress connection.
//!
//! ## Responsibility
//!
//! The [`ClientCore`] struct focuses on a single, well-defined responsibility:
//! - Connect to the embedding server
//! - Send a job submission with cover and payload metadata
//! - Receive the accept/reject verdict
//! - On acceptance, hand the open connection to the caller for progress
//!   streaming
//!
//! ## Design Philosophy
//!
//! This core component is intentionally minimal and stateless. It does not
//! handle:
//! - Form state or validation (that lives in the
//!   [`UiCoordinator`](super::coordinator::UiCoordinator))
//! - Progress bookkeeping (that lives in
//!   [`ProgressChannel`](crate::progress::ProgressChannel))
//! - Draining the progress stream (that lives in
//!   [`RemoteFeed`](super::feed::RemoteFeed))
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stegoshare::client::client::ClientCore;
//!
//! let core = ClientCore::new("Client1".to_string());
//!
//! match core.submit_with_retry(&config.client.server_address, request).await? {
//!     SubmitOutcome::Accepted(conn) => { /* stream progress from conn */ }
//!     SubmitOutcome::Rejected { reason } => eprintln!("{}", reason),
//! }
//! ```

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::capacity::CoverImage;
use crate::common::connection::Connection;
use crate::common::messages::{JobId, Message, PayloadKind};

/// Client configuration loaded from TOML file.
///
/// # Example TOML
///
/// ```toml
/// [client]
/// name = "Client1"
/// server_address = "127.0.0.1:9300"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client identity and server connection information
    pub client: ClientInfo,
}

/// Client identity and server address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Unique name for this client (e.g., "Client1")
    pub name: String,
    /// Address of the embedding server (e.g., "127.0.0.1:9300")
    pub server_address: String,
}

impl ClientConfig {
    /// Loads client configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// * `Ok(ClientConfig)` - Successfully parsed configuration
    /// * `Err(anyhow::Error)` - If file reading or parsing fails
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Everything the server needs to know about one embedding job.
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest {
    /// Client-chosen identifier for the job
    pub job_id: JobId,
    /// Cover image metadata (dimensions and file size)
    pub cover: CoverImage,
    /// Size of the payload to embed
    pub payload_size_bytes: u64,
    /// Kind of payload being embedded
    pub payload_kind: PayloadKind,
}

/// The server's answer to a submission.
///
/// Both variants are FINAL verdicts: a rejection is a validated answer, not a
/// transport failure, and must not be retried.
pub enum SubmitOutcome {
    /// The job was accepted. The connection now carries its progress stream;
    /// the caller owns draining it.
    Accepted(Connection),
    /// The job was refused with a display-ready reason.
    Rejected { reason: String },
}

/// The minimal core client that submits jobs and relays the verdict.
///
/// # Fields
///
/// * `client_name` - Unique identifier for this client, used in requests and logging
pub struct ClientCore {
    /// The unique name identifying this client
    client_name: String,
}

impl ClientCore {
    /// Creates a new `ClientCore` instance with the specified name.
    ///
    /// # Arguments
    ///
    /// * `client_name` - A unique identifier for this client
    pub fn new(client_name: String) -> Self {
        Self { client_name }
    }

    /// Submits one embedding job and waits for the server's verdict.
    ///
    /// This method performs the complete submission workflow:
    /// 1. Connects to the server address
    /// 2. Sends a `SubmitJob` with the cover and payload metadata
    /// 3. Waits for `JobAccepted` or `JobRejected`
    /// 4. On acceptance, returns the still-open connection so the caller can
    ///    drain progress updates from it
    ///
    /// # Arguments
    ///
    /// * `server_address` - Network address of the server (e.g., "127.0.0.1:9300")
    /// * `request` - Metadata describing the job to submit
    ///
    /// # Returns
    ///
    /// * `Ok(SubmitOutcome)` - The server's verdict (accepted or rejected)
    /// * `Err(anyhow::Error)` - Connection failed, or the server answered with
    ///   something other than a verdict
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Connection to the server fails
    /// * Message transmission fails
    /// * The connection closes before a verdict arrives
    pub async fn submit(
        &self,
        server_address: &str,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        info!(
            "📤 {} Submitting job #{} to server at {}",
            self.client_name, request.job_id, server_address
        );

        // Connect to the embedding server
        let stream = TcpStream::connect(server_address).await?;
        let mut conn = Connection::new(stream);

        // Construct and send the submission
        let submit = Message::SubmitJob {
            job_id: request.job_id,
            client_name: self.client_name.clone(),
            cover: request.cover,
            payload_size_bytes: request.payload_size_bytes,
            payload_kind: request.payload_kind,
        };

        conn.write_message(&submit).await?;

        // Wait for the verdict
        match conn.read_message().await? {
            Some(Message::JobAccepted { job_id }) => {
                info!(
                    "✅ {} Job #{} accepted, progress follows",
                    self.client_name, job_id
                );
                Ok(SubmitOutcome::Accepted(conn))
            }
            Some(Message::JobRejected { job_id, reason }) => {
                warn!("❌ {} Job #{} rejected: {}", self.client_name, job_id, reason);
                Ok(SubmitOutcome::Rejected { reason })
            }
            _ => Err(anyhow::anyhow!(
                "Unexpected response or connection closed"
            )),
        }
    }

    /// Submits a job with retry on transport failure.
    ///
    /// This method implements the complete retry workflow:
    /// 1. Attempts the submission up to 3 times
    /// 2. Each attempt has a 10-second timeout
    /// 3. Waits 5 seconds between retry attempts
    ///
    /// A `Rejected` verdict is returned immediately without retrying: the
    /// server answered, it just said no.
    ///
    /// # Arguments
    ///
    /// * `server_address` - Network address of the server
    /// * `request` - Metadata describing the job to submit
    ///
    /// # Returns
    ///
    /// * `Ok(SubmitOutcome)` - A verdict obtained within the retry attempts
    /// * `Err(anyhow::Error)` - All attempts failed
    ///
    /// # Retry Parameters
    ///
    /// - **Max retries**: 3 attempts
    /// - **Timeout**: 10 seconds per attempt
    /// - **Retry delay**: 5 seconds between attempts
    pub async fn submit_with_retry(
        &self,
        server_address: &str,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        const MAX_RETRIES: u32 = 3;
        const TIMEOUT_SECS: u64 = 10;
        const RETRY_INTERVAL_SECS: u64 = 5;

        for attempt in 1..=MAX_RETRIES {
            if attempt > 1 {
                info!(
                    "🔄 {} Retry attempt {}/{} for job #{}",
                    self.client_name, attempt, MAX_RETRIES, request.job_id
                );
                sleep(Duration::from_secs(RETRY_INTERVAL_SECS)).await;
            }

            let result = tokio::time::timeout(
                Duration::from_secs(TIMEOUT_SECS),
                self.submit(server_address, request),
            )
            .await;

            match result {
                Ok(Ok(outcome)) => return Ok(outcome),
                Ok(Err(e)) => {
                    warn!(
                        "Job #{} submission failed on attempt {}/{}: {}",
                        request.job_id, attempt, MAX_RETRIES, e
                    );
                }
                Err(_) => {
                    warn!(
                        "Job #{} submission timed out after {}s on attempt {}/{}",
                        request.job_id, TIMEOUT_SECS, attempt, MAX_RETRIES
                    );
                }
            }
        }

        Err(anyhow::anyhow!(
            "Job #{} submission failed after {} attempts",
            request.job_id,
            MAX_RETRIES
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[test]
    fn test_from_file_parses_client_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[client]\nname = \"Client1\"\nserver_address = \"127.0.0.1:9300\"\n"
        )
        .unwrap();

        let config = ClientConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.client.name, "Client1");
        assert_eq!(config.client.server_address, "127.0.0.1:9300");
    }

    #[tokio::test]
    async fn test_rejected_verdict_is_final_and_never_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicU32::new(0));

        // A server that rejects every submission it sees.
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                accepted.fetch_add(1, Ordering::SeqCst);
                let mut conn = Connection::new(stream);
                if let Ok(Some(Message::SubmitJob { job_id, .. })) = conn.read_message().await {
                    conn.write_message(&Message::JobRejected {
                        job_id,
                        reason: "Error: The cover image is too small. Minimum size is 1 KB."
                            .to_string(),
                    })
                    .await
                    .unwrap();
                }
            }
        });

        let core = ClientCore::new("RetryClient".to_string());
        let request = SubmitRequest {
            job_id: 1,
            cover: CoverImage {
                width_px: 100,
                height_px: 100,
                size_bytes: 512,
            },
            payload_size_bytes: 10,
            payload_kind: PayloadKind::Text,
        };

        let outcome = core
            .submit_with_retry(&addr.to_string(), request)
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::Rejected { reason } => {
                assert_eq!(
                    reason,
                    "Error: The cover image is too small. Minimum size is 1 KB."
                );
            }
            SubmitOutcome::Accepted(_) => panic!("rejecting server cannot accept"),
        }

        // The verdict is final: exactly one submission attempt was made.
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }
}
