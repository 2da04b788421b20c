//! # Embedding Capacity Model
//!
//! Computes how much payload data a cover image can carry under LSB
//! (Least Significant Bit) steganography.
//!
//! ## Capacity Formula
//!
//! Each pixel contributes one data bit per color channel. Only the R, G and B
//! channels are used (the alpha channel is skipped so embedded images survive
//! formats without transparency), so:
//!
//! ```text
//! capacity_bits = width * height * 3
//! capacity_kb   = capacity_bits / 8 / 1024
//! ```
//!
//! Example: an 800x600 cover can carry ~175 KB of payload.
//!
//! The KB value is kept unrounded internally; rounding to two decimals happens
//! only when a value is rendered for display. Validation must compare against
//! the unrounded value, otherwise payloads within a few bytes of the limit get
//! accepted or rejected incorrectly.

use serde::{Deserialize, Serialize};

/// Usable bits per pixel: one per R, G and B channel. Alpha is never counted.
pub const CHANNELS_PER_PIXEL: u64 = 3;

/// Metadata of a selected cover image.
///
/// `width_px`/`height_px` are the *decoded* pixel dimensions of the file, not
/// display-scaled ones; they only exist after the asynchronous decode has
/// finished. A new selection replaces the whole value, it is never patched in
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverImage {
    /// Decoded width in pixels
    pub width_px: u32,
    /// Decoded height in pixels
    pub height_px: u32,
    /// On-disk size of the file in bytes
    pub size_bytes: u64,
}

impl CoverImage {
    /// File size in KB (unrounded).
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Metadata of the payload file selected for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFile {
    /// On-disk size of the file in bytes
    pub size_bytes: u64,
}

impl PayloadFile {
    /// File size in KB (unrounded).
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Embedding capacity derived from a cover image's pixel dimensions.
///
/// Recomputed from scratch whenever a new cover is selected; an estimate from
/// a previous selection must never be reused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityEstimate {
    /// Total embeddable bits: `width * height * 3`
    pub capacity_bits: u64,
    /// The same capacity in KB, unrounded
    pub capacity_kb: f64,
}

impl CapacityEstimate {
    /// Capacity rounded to two decimals, for display only (e.g. `"3.66"`).
    pub fn display_kb(&self) -> String {
        format!("{:.2}", self.capacity_kb)
    }
}

/// Estimate the embedding capacity of a cover image.
///
/// A pure function of the decoded dimensions: calling it twice on the same
/// cover yields identical results. Zero-dimension images are valid input and
/// yield a zero estimate; rejecting degenerate files is the validator's job
/// (via the minimum byte-size floor), not this model's. At the other extreme
/// the bit count saturates at `u64::MAX`: the server estimates over
/// client-submitted metadata, so the arithmetic stays total for any
/// dimensions a peer can claim.
///
/// # Arguments
/// - `cover`: Decoded cover image metadata
///
/// # Example
/// ```ignore
/// let cover = CoverImage { width_px: 100, height_px: 100, size_bytes: 40_960 };
/// let estimate = capacity::estimate(&cover);
/// assert_eq!(estimate.capacity_bits, 30_000);
/// println!("Maximum capacity: {} KB", estimate.display_kb()); // "3.66"
/// ```
pub fn estimate(cover: &CoverImage) -> CapacityEstimate {
    // The pixel product fits u64 even at u32::MAX per side; only the channel
    // multiply can overflow, so it saturates instead of panicking.
    let capacity_bits =
        (cover.width_px as u64 * cover.height_px as u64).saturating_mul(CHANNELS_PER_PIXEL);
    let capacity_kb = capacity_bits as f64 / 8.0 / 1024.0;

    CapacityEstimate {
        capacity_bits,
        capacity_kb,
    }
}
