//! # Message Protocol
//!
//! Defines all message types exchanged between the StegoShare client and the
//! embedding server:
//! - Job submission with cover-image and payload metadata
//! - Acceptance / rejection verdicts
//! - Streamed embedding progress updates
//!
//! Messages are serialized to JSON and sent over TCP with a 4-byte length prefix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capacity::CoverImage;

// ============================================================================
// MESSAGE TYPES - Protocol for Job Submission and Progress Streaming
// ============================================================================

/// Identifier for one submitted embedding job, chosen by the client.
pub type JobId = u64;

/// What kind of payload the client intends to hide in the cover image.
///
/// The server only needs this for logging and capacity bookkeeping; the
/// embedding treats every payload as an opaque byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Plain text typed or pasted by the user
    Text,
    /// An image file selected from disk
    Image,
    /// An audio file
    Audio,
    /// A video file
    Video,
}

impl FromStr for PayloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(PayloadKind::Text),
            "image" => Ok(PayloadKind::Image),
            "audio" => Ok(PayloadKind::Audio),
            "video" => Ok(PayloadKind::Video),
            other => Err(format!(
                "unknown payload kind '{}' (expected text, image, audio or video)",
                other
            )),
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Text => write!(f, "text"),
            PayloadKind::Image => write!(f, "image"),
            PayloadKind::Audio => write!(f, "audio"),
            PayloadKind::Video => write!(f, "video"),
        }
    }
}

/// Core message enum for all client-server communication in StegoShare
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    // ========== JOB SUBMISSION ==========
    /// **Job Submission**
    ///
    /// Sent by a client to request an embedding job. Carries metadata only;
    /// the actual file bytes travel out of band.
    ///
    /// # Fields
    /// - `job_id`: Client-chosen identifier for this job
    /// - `client_name`: Name of the submitting client (for logging)
    /// - `cover`: Dimensions and file size of the cover image
    /// - `payload_size_bytes`: Size of the payload to embed
    /// - `payload_kind`: What kind of payload is being embedded
    ///
    /// # Server Enforcement
    /// The server re-runs the full validation against these fields before
    /// accepting. Client-side checks are advisory; this is the authoritative
    /// gate.
    SubmitJob {
        job_id: JobId,
        client_name: String,
        cover: CoverImage,
        payload_size_bytes: u64,
        payload_kind: PayloadKind,
    },

    /// **Job Accepted**
    ///
    /// The submission passed validation; the embedding job has started.
    /// Progress updates for the job follow on the same connection.
    ///
    /// # Fields
    /// - `job_id`: ID of the accepted job
    JobAccepted { job_id: JobId },

    /// **Job Rejected**
    ///
    /// The submission failed validation. No job was started and no progress
    /// updates will follow.
    ///
    /// # Fields
    /// - `job_id`: ID of the rejected job
    /// - `reason`: Human-readable rejection message, suitable for display
    JobRejected { job_id: JobId, reason: String },

    // ========== PROGRESS STREAMING ==========
    /// **Progress Update**
    ///
    /// Pushed by the server while an accepted job runs. The job is identified
    /// by the connection the update arrives on, so the payload carries only
    /// the percentage.
    ///
    /// # Fields
    /// - `progress`: Completion percentage in `[0, 100]`; `100` means done
    ProgressUpdate { progress: u8 },
}

impl Message {
    /// Serialize a message to JSON bytes for transmission over the network.
    ///
    /// # Returns
    /// - `Ok(Vec<u8>)`: JSON-encoded message bytes
    /// - `Err`: Serialization error
    ///
    /// # Example
    /// ```ignore
    /// let msg = Message::ProgressUpdate { progress: 50 };
    /// let bytes = msg.to_bytes()?;
    /// ```
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a message from JSON bytes received from the network.
    ///
    /// # Arguments
    /// - `bytes`: JSON-encoded message data
    ///
    /// # Returns
    /// - `Ok(Message)`: Deserialized message
    /// - `Err`: Deserialization error
    ///
    /// # Example
    /// ```ignore
    /// let msg = Message::from_bytes(&received_bytes)?;
    /// match msg {
    ///     Message::ProgressUpdate { progress } => println!("At {}%", progress),
    ///     _ => {}
    /// }
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_kind_parses_case_insensitively() {
        assert_eq!("text".parse::<PayloadKind>().unwrap(), PayloadKind::Text);
        assert_eq!("Image".parse::<PayloadKind>().unwrap(), PayloadKind::Image);
        assert!("pdf".parse::<PayloadKind>().is_err());
    }

    #[test]
    fn test_payload_kind_display_round_trips() {
        for kind in [
            PayloadKind::Text,
            PayloadKind::Image,
            PayloadKind::Audio,
            PayloadKind::Video,
        ] {
            assert_eq!(kind.to_string().parse::<PayloadKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_progress_update_wire_shape() {
        // The progress payload is a single integer field named "progress".
        let bytes = Message::ProgressUpdate { progress: 73 }.to_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["ProgressUpdate"]["progress"], 73);
    }
}
