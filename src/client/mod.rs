//! # Client Components
//!
//! The client is split into three main components:
//!
//! ## Core Client ([`client`])
//! Handles the primary responsibility: submitting embedding jobs and
//! receiving the server's verdict. Includes retry logic (3 attempts with
//! timeouts) for transport failures.
//!
//! ## UI Coordinator ([`coordinator`])
//! Manages all form concerns:
//! - Cover selection with stale-decode protection
//! - Automatic capacity recomputation
//! - Advisory validation and submit gating
//! - Progress state for rendering
//!
//! ## Remote Feed ([`feed`])
//! Pumps progress updates from accepted-job connections to subscribers.

pub mod client;
pub mod coordinator;
pub mod feed;

// Re-export for convenience
pub use client::{ClientCore, SubmitOutcome};
pub use coordinator::UiCoordinator;
pub use feed::RemoteFeed;
