//! # Remote Progress Feed
//!
//! Bridges accepted-job connections to [`ProgressFeed`] subscribers.
//!
//! After the server accepts a submission it keeps pushing `ProgressUpdate`
//! messages on the same connection until the job completes. [`RemoteFeed`]
//! owns a registry of per-job channel senders: subscribing registers a sender,
//! attaching a connection spawns a pump task that reads frames and forwards
//! the percentages. When the connection ends (completion or failure) the pump
//! unregisters the sender, which closes the subscriber's receiver - that is
//! how feed loss is observed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::common::connection::Connection;
use crate::common::messages::{JobId, Message};
use crate::progress::{ProgressEvent, ProgressFeed};

/// Capacity of a subscriber channel. Events are tiny and consumed promptly.
const FEED_BUFFER: usize = 100;

/// TCP-backed implementation of [`ProgressFeed`].
///
/// Cloneable handle; all clones share one registry.
#[derive(Clone)]
pub struct RemoteFeed {
    /// Per-job senders, registered by `subscribe` and removed by the pump
    /// task when the stream ends
    senders: Arc<Mutex<HashMap<JobId, mpsc::Sender<ProgressEvent>>>>,
}

impl RemoteFeed {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pump progress updates for `job_id` from an accepted-job connection.
    ///
    /// Call [`subscribe`](ProgressFeed::subscribe) first, then hand the
    /// connection returned by submission here. The pump runs until the server
    /// closes the connection, an I/O error occurs, or the subscriber goes
    /// away, and always unregisters the job on exit.
    pub fn attach(&self, job_id: JobId, mut conn: Connection) {
        let senders = Arc::clone(&self.senders);

        tokio::spawn(async move {
            loop {
                match conn.read_message().await {
                    Ok(Some(Message::ProgressUpdate { progress })) => {
                        // Look up, then send outside the lock.
                        let tx = senders.lock().unwrap().get(&job_id).cloned();

                        match tx {
                            Some(tx) => {
                                if tx.send(ProgressEvent { progress }).await.is_err() {
                                    // Subscriber dropped the receiver.
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    Ok(Some(msg)) => {
                        warn!("⚠️  Unexpected message on progress stream: {:?}", msg);
                    }
                    Ok(None) => {
                        info!("🔌 Progress stream for job #{} ended", job_id);
                        break;
                    }
                    Err(e) => {
                        error!("❌ Progress stream for job #{} failed: {}", job_id, e);
                        break;
                    }
                }
            }

            senders.lock().unwrap().remove(&job_id);
        });
    }
}

impl ProgressFeed for RemoteFeed {
    fn subscribe(&self, job_id: JobId) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        self.senders.lock().unwrap().insert(job_id, tx);
        rx
    }
}
