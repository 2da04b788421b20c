//! # Pre-Submission File Validation
//!
//! Cross-checks the selected cover image and payload file against the
//! capacity estimate before a job is submitted.
//!
//! ## Check Ordering
//!
//! Checks run in a fixed sequence and the first failure wins, matching how a
//! user fixes a form: sort out the cover first, then the payload.
//!
//! 1. Cover image at least 1 KB on disk (floor against degenerate/empty files
//!    that could never survive the embedding pipeline).
//! 2. Payload size no larger than the embedding capacity, compared in KB
//!    against the *unrounded* estimate.
//!
//! A check whose operands are not available yet (file not selected, cover not
//! decoded) is skipped rather than failed: validation is advisory and must
//! never deadlock the form. The embedding server re-runs the same checks as
//! final enforcement when a job is submitted.

use crate::capacity::{CapacityEstimate, CoverImage, PayloadFile};

/// Minimum cover image size in KB. Anything below this is rejected outright.
pub const MIN_COVER_KB: f64 = 1.0;

/// Outcome of validating the current cover/payload selection.
///
/// The failure variants carry the numbers that produced the verdict so the
/// message can show them to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// All available checks passed; submission may proceed.
    Ok,
    /// The cover image is below the 1 KB floor.
    CoverTooSmall {
        /// Size of the selected cover in KB (unrounded)
        cover_kb: f64,
        /// The floor that was violated
        minimum_kb: f64,
    },
    /// The payload does not fit into the cover's embedding capacity.
    PayloadExceedsCapacity {
        /// Payload size in KB (unrounded)
        payload_kb: f64,
        /// Capacity of the cover in KB (unrounded)
        capacity_kb: f64,
    },
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationResult::Ok)
    }

    /// User-facing message for a failed verdict, `None` when validation
    /// passed. Sizes are rendered in KB with two decimals; the verdicts
    /// themselves were produced from the unrounded values.
    pub fn message(&self) -> Option<String> {
        match self {
            ValidationResult::Ok => None,
            ValidationResult::CoverTooSmall { .. } => Some(
                "Error: The cover image is too small. Minimum size is 1 KB.".to_string(),
            ),
            ValidationResult::PayloadExceedsCapacity {
                payload_kb,
                capacity_kb,
            } => Some(format!(
                "Error: The selected file size ({:.2} KB) exceeds the maximum capacity ({:.2} KB).",
                payload_kb, capacity_kb
            )),
        }
    }
}

/// Validate the current selection against the capacity contract.
///
/// # Arguments
/// - `cover`: Selected cover image, if any
/// - `payload`: Selected payload file, if any
/// - `estimate`: Capacity estimate for the cover, if it has been decoded yet
///
/// # Returns
/// The first failing check in order, or [`ValidationResult::Ok`] when every
/// check passed or was skipped for lack of input.
///
/// # Boundary Behavior
/// - A cover of exactly 1.0 KB passes (strict `<`).
/// - A payload exactly equal to the capacity passes (strict `>`), compared at
///   full floating precision, never against a value already rounded for
///   display.
pub fn validate(
    cover: Option<&CoverImage>,
    payload: Option<&PayloadFile>,
    estimate: Option<&CapacityEstimate>,
) -> ValidationResult {
    if let Some(cover) = cover {
        if cover.size_kb() < MIN_COVER_KB {
            return ValidationResult::CoverTooSmall {
                cover_kb: cover.size_kb(),
                minimum_kb: MIN_COVER_KB,
            };
        }
    }

    if let (Some(payload), Some(estimate)) = (payload, estimate) {
        if payload.size_kb() > estimate.capacity_kb {
            return ValidationResult::PayloadExceedsCapacity {
                payload_kb: payload.size_kb(),
                capacity_kb: estimate.capacity_kb,
            };
        }
    }

    ValidationResult::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity;

    fn cover(width: u32, height: u32, size_bytes: u64) -> CoverImage {
        CoverImage {
            width_px: width,
            height_px: height,
            size_bytes,
        }
    }

    #[test]
    fn test_undersized_cover_reported_before_oversized_payload() {
        // 0.5 KB cover AND a payload far over capacity: the cover verdict wins.
        let c = cover(10, 10, 512);
        let est = capacity::estimate(&c);
        let payload = PayloadFile {
            size_bytes: 1_000_000,
        };

        let result = validate(Some(&c), Some(&payload), Some(&est));
        assert!(matches!(result, ValidationResult::CoverTooSmall { .. }));
    }

    #[test]
    fn test_cover_of_exactly_one_kb_passes() {
        let c = cover(100, 100, 1024);
        let est = capacity::estimate(&c);
        let payload = PayloadFile { size_bytes: 0 };

        assert!(validate(Some(&c), Some(&payload), Some(&est)).is_ok());
    }

    #[test]
    fn test_payload_exactly_at_capacity_passes() {
        // 100x100 -> 30000 bits -> 3750 bytes of capacity.
        let c = cover(100, 100, 2048);
        let est = capacity::estimate(&c);

        let at_limit = PayloadFile { size_bytes: 3750 };
        assert!(validate(Some(&c), Some(&at_limit), Some(&est)).is_ok());
    }

    #[test]
    fn test_payload_one_byte_over_capacity_fails() {
        // 3751 bytes still displays as "3.66 KB" but must be rejected: the
        // comparison runs on the unrounded values.
        let c = cover(100, 100, 2048);
        let est = capacity::estimate(&c);

        let over_limit = PayloadFile { size_bytes: 3751 };
        let result = validate(Some(&c), Some(&over_limit), Some(&est));
        match result {
            ValidationResult::PayloadExceedsCapacity {
                payload_kb,
                capacity_kb,
            } => {
                assert!(payload_kb > capacity_kb);
                // Both round to the same two-decimal display value.
                assert_eq!(format!("{:.2}", payload_kb), "3.66");
                assert_eq!(format!("{:.2}", capacity_kb), "3.66");
            }
            other => panic!("expected PayloadExceedsCapacity, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_byte_payload_never_exceeds_capacity() {
        let c = cover(1280, 800, 500 * 1024);
        let est = capacity::estimate(&c);
        let payload = PayloadFile { size_bytes: 0 };

        assert!(validate(Some(&c), Some(&payload), Some(&est)).is_ok());
    }

    #[test]
    fn test_missing_inputs_skip_their_checks() {
        let c = cover(100, 100, 4096);
        let est = capacity::estimate(&c);
        let payload = PayloadFile {
            size_bytes: 1_000_000,
        };

        // Nothing selected at all.
        assert!(validate(None, None, None).is_ok());
        // Payload selected but cover not decoded yet: capacity unknown, skip.
        assert!(validate(None, Some(&payload), None).is_ok());
        // Cover selected, no payload yet.
        assert!(validate(Some(&c), None, Some(&est)).is_ok());
    }

    #[test]
    fn test_messages_carry_both_sizes_with_two_decimals() {
        let c = cover(100, 100, 2048);
        let est = capacity::estimate(&c);
        let payload = PayloadFile { size_bytes: 8192 };

        let msg = validate(Some(&c), Some(&payload), Some(&est))
            .message()
            .expect("oversized payload must produce a message");
        assert_eq!(
            msg,
            "Error: The selected file size (8.00 KB) exceeds the maximum capacity (3.66 KB)."
        );

        let small = cover(100, 100, 512);
        let msg = validate(Some(&small), None, None)
            .message()
            .expect("undersized cover must produce a message");
        assert_eq!(msg, "Error: The cover image is too small. Minimum size is 1 KB.");

        assert_eq!(ValidationResult::Ok.message(), None);
    }
}
