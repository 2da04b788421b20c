//! # Server Core - Embedding Job Service
//!
//! The server is responsible for ONE thing: accepting embedding job
//! submissions, enforcing validation, and streaming progress while the job
//! runs.
//!
//! Client-side validation is advisory only; whatever the form said, the
//! server re-runs the same checks over the submitted metadata and its verdict
//! is the one that counts. Each connection carries exactly one job: submit,
//! verdict, progress stream, close.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

use crate::capacity::{estimate, PayloadFile};
use crate::common::connection::Connection;
use crate::common::messages::Message;
use crate::server::config::ServerConfig;
use crate::server::job::{run_job, EmbedJob};
use crate::validate::validate;

/// The embedding server: a listener plus the job pacing settings.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
}

impl Server {
    /// Bind the configured address.
    ///
    /// Binding is split from [`run`](Self::run) so callers can learn the
    /// actual listening address first (the config may name port 0).
    ///
    /// # Example
    /// ```ignore
    /// let server = Server::bind(ServerConfig::from_file("config/server.toml")?).await?;
    /// server.run().await?;
    /// ```
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.server.address).await?;
        info!("📡 Server listening on {}", listener.local_addr()?);
        Ok(Self { config, listener })
    }

    /// The address the server actually listens on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept submissions forever, one task per connection.
    pub async fn run(self) -> Result<()> {
        info!("🚀 Server accepting embedding jobs");

        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    debug!("🔗 Accepted connection from {}", addr);

                    let row_delay_ms = self.config.job.row_delay_ms;
                    tokio::spawn(async move {
                        handle_connection(socket, row_delay_ms).await;
                    });
                }
                Err(e) => error!("❌ Accept error: {}", e),
            }
        }
    }
}

/// Handle one client connection: wait for a submission, enforce validation,
/// then either reject or accept-and-run.
async fn handle_connection(socket: TcpStream, row_delay_ms: u64) {
    let mut conn = Connection::new(socket);

    loop {
        match conn.read_message().await {
            Ok(Some(Message::SubmitJob {
                job_id,
                client_name,
                cover,
                payload_size_bytes,
                payload_kind,
            })) => {
                info!(
                    "📥 Job #{} from '{}': {} payload, {} bytes, cover {}x{}",
                    job_id,
                    client_name,
                    payload_kind,
                    payload_size_bytes,
                    cover.width_px,
                    cover.height_px
                );

                // Authoritative re-validation of the submitted metadata. The
                // capacity is recomputed here, never trusted from the client.
                let payload = PayloadFile {
                    size_bytes: payload_size_bytes,
                };
                let capacity = estimate(&cover);
                let verdict = validate(Some(&cover), Some(&payload), Some(&capacity));

                if let Some(reason) = verdict.message() {
                    warn!("❌ Rejected job #{}: {}", job_id, reason);
                    if let Err(e) = conn
                        .write_message(&Message::JobRejected { job_id, reason })
                        .await
                    {
                        error!("❌ Failed to send rejection for job #{}: {}", job_id, e);
                    }
                    break;
                }

                if let Err(e) = conn.write_message(&Message::JobAccepted { job_id }).await {
                    error!("❌ Failed to send acceptance for job #{}: {}", job_id, e);
                    break;
                }

                let job = EmbedJob {
                    job_id,
                    client_name,
                    cover,
                    payload_size_bytes,
                    payload_kind,
                };

                if let Err(e) = run_job(&job, row_delay_ms, &mut conn).await {
                    error!("❌ Job #{} aborted: {}", job_id, e);
                }

                // One job per connection; closing tells the client the
                // stream is over.
                break;
            }
            Ok(Some(msg)) => {
                warn!("⚠️  Unexpected message before submission: {:?}", msg);
            }
            Ok(None) => {
                debug!("🔌 Connection closed");
                break;
            }
            Err(e) => {
                error!("❌ Error reading message: {}", e);
                break;
            }
        }
    }
}
