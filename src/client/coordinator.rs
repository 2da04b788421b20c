//! # UI Coordinator
//!
//! This module wires the capacity model, the validator and the progress
//! channel into one form-shaped state machine. A frontend (the bundled
//! terminal client, or anything else) owns a [`UiCoordinator`] and calls into
//! it as the user interacts:
//!
//! - **Cover selection** is asynchronous: picking a file starts a decode, and
//!   only the decode belonging to the *latest* selection may land. Each
//!   selection gets a [`SelectionToken`]; results carrying a superseded token
//!   are discarded, so a slow decode of an old pick can never overwrite a
//!   newer one.
//! - **Capacity** recomputes automatically whenever a cover decode lands.
//! - **Validation** is advisory and never blocks selection; it only gates
//!   submission.
//! - **Progress** stays hidden until a submission starts, then mirrors the
//!   server: events are applied as they arrive and a lost feed keeps the last
//!   value visible with a marker.
//!
//! The coordinator performs no I/O itself. The async helpers
//! [`decode_cover`] and [`inspect_payload`] do the blocking file work on the
//! blocking pool and hand back plain metadata.

use anyhow::Result;
use std::path::Path;
use tokio::task;

use crate::capacity::{estimate, CapacityEstimate, CoverImage, PayloadFile};
use crate::client::client::SubmitRequest;
use crate::common::messages::{JobId, PayloadKind};
use crate::progress::{ProgressChannel, ProgressEvent, ProgressState};
use crate::validate::{validate, ValidationResult};

/// Identifies one cover-selection gesture. Decode results must present the
/// token of the selection that started them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

/// Form state for the embedding workflow.
pub struct UiCoordinator {
    cover: Option<CoverImage>,
    payload: Option<PayloadFile>,
    estimate: Option<CapacityEstimate>,
    payload_kind: PayloadKind,
    progress: ProgressChannel,
    /// Bumped on every cover selection; stale decode results are recognized
    /// by carrying an older value
    selection_seq: u64,
    /// Next job id to hand out, starting at 1
    next_job_id: JobId,
    /// Set once the first submission starts; the progress indicator stays
    /// hidden until then
    submission_started: bool,
}

impl UiCoordinator {
    pub fn new() -> Self {
        Self {
            cover: None,
            payload: None,
            estimate: None,
            payload_kind: PayloadKind::Text,
            progress: ProgressChannel::new(),
            selection_seq: 0,
            next_job_id: 1,
            submission_started: false,
        }
    }

    // ==================== COVER SELECTION ====================

    /// Start a new cover selection.
    ///
    /// Clears the current cover and its capacity estimate (the form shows
    /// nothing until the new decode lands) and returns the token the decode
    /// result must present.
    pub fn begin_cover_selection(&mut self) -> SelectionToken {
        self.selection_seq += 1;
        self.cover = None;
        self.estimate = None;
        SelectionToken(self.selection_seq)
    }

    /// Land a finished cover decode.
    ///
    /// Returns `false` (and changes nothing) when the token belongs to a
    /// superseded selection. Otherwise stores the cover and recomputes the
    /// capacity estimate.
    pub fn apply_cover_decode(&mut self, token: SelectionToken, cover: CoverImage) -> bool {
        if token.0 != self.selection_seq {
            return false;
        }
        self.estimate = Some(estimate(&cover));
        self.cover = Some(cover);
        true
    }

    // ==================== PAYLOAD SELECTION ====================

    pub fn set_payload(&mut self, payload: PayloadFile) {
        self.payload = Some(payload);
    }

    pub fn clear_payload(&mut self) {
        self.payload = None;
    }

    pub fn set_payload_kind(&mut self, kind: PayloadKind) {
        self.payload_kind = kind;
    }

    // ==================== CAPACITY & VALIDATION ====================

    /// The capacity line shown next to the cover picker, when known.
    pub fn capacity_line(&self) -> Option<String> {
        self.estimate
            .map(|est| format!("Maximum capacity: {} KB", est.display_kb()))
    }

    /// Advisory validation of whatever is currently selected.
    pub fn validation(&self) -> ValidationResult {
        validate(
            self.cover.as_ref(),
            self.payload.as_ref(),
            self.estimate.as_ref(),
        )
    }

    /// Whether a submission may start: both files picked and validation clean.
    pub fn can_submit(&self) -> bool {
        self.cover.is_some() && self.payload.is_some() && self.validation().is_ok()
    }

    // ==================== SUBMISSION ====================

    /// Begin a submission: gate on [`can_submit`](Self::can_submit), reset
    /// the progress channel and assemble the job metadata.
    ///
    /// Returns `None` when the form is not submittable.
    pub fn begin_submission(&mut self) -> Option<SubmitRequest> {
        if !self.can_submit() {
            return None;
        }
        let (Some(cover), Some(payload)) = (self.cover, self.payload) else {
            return None;
        };

        self.progress.reset();
        self.submission_started = true;

        let job_id = self.next_job_id;
        self.next_job_id += 1;

        Some(SubmitRequest {
            job_id,
            cover,
            payload_size_bytes: payload.size_bytes,
            payload_kind: self.payload_kind,
        })
    }

    // ==================== PROGRESS ====================

    pub fn apply_progress(&mut self, event: ProgressEvent) {
        self.progress.apply(event);
    }

    pub fn mark_feed_lost(&mut self) {
        self.progress.mark_feed_lost();
    }

    pub fn progress_state(&self) -> ProgressState {
        self.progress.state()
    }

    /// Bar fill percentage, `0..=100`. `None` while the indicator is still
    /// hidden (no submission has started yet).
    pub fn progress_fill(&self) -> Option<u8> {
        if !self.submission_started {
            return None;
        }
        Some(self.progress.state().percent)
    }

    /// Text shown next to the bar, e.g. `42%`, with a marker when the feed
    /// was lost mid-job. `None` while the indicator is still hidden.
    pub fn progress_label(&self) -> Option<String> {
        if !self.submission_started {
            return None;
        }
        let state = self.progress.state();
        if self.progress.feed_lost() {
            Some(format!("{}% (connection lost)", state.percent))
        } else {
            Some(format!("{}%", state.percent))
        }
    }
}

// ==================== ASYNC FILE HELPERS ====================

/// Decode a cover image's dimensions and file size.
///
/// Only the header is decoded; pixel data is never loaded. Runs on the
/// blocking pool so the caller's task is not stalled by disk I/O.
pub async fn decode_cover(path: &Path) -> Result<CoverImage> {
    let path = path.to_owned();
    task::spawn_blocking(move || -> Result<CoverImage> {
        let size_bytes = std::fs::metadata(&path)?.len();
        let (width_px, height_px) = image::image_dimensions(&path)?;
        Ok(CoverImage {
            width_px,
            height_px,
            size_bytes,
        })
    })
    .await?
}

/// Read a payload file's size. The payload is opaque; only its byte count
/// matters for capacity checks.
pub async fn inspect_payload(path: &Path) -> Result<PayloadFile> {
    let path = path.to_owned();
    task::spawn_blocking(move || -> Result<PayloadFile> {
        let size_bytes = std::fs::metadata(&path)?.len();
        Ok(PayloadFile { size_bytes })
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Phase;

    fn cover_100x100() -> CoverImage {
        CoverImage {
            width_px: 100,
            height_px: 100,
            size_bytes: 50 * 1024,
        }
    }

    #[test]
    fn test_stale_cover_decode_is_discarded() {
        let mut ui = UiCoordinator::new();

        let first = ui.begin_cover_selection();
        let second = ui.begin_cover_selection();

        // The slow decode of the first pick lands last - and must lose.
        assert!(!ui.apply_cover_decode(first, cover_100x100()));
        assert!(ui.capacity_line().is_none());

        assert!(ui.apply_cover_decode(second, cover_100x100()));
        assert!(ui.capacity_line().is_some());
    }

    #[test]
    fn test_new_selection_clears_previous_estimate() {
        let mut ui = UiCoordinator::new();
        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        assert!(ui.capacity_line().is_some());

        ui.begin_cover_selection();
        assert!(ui.capacity_line().is_none());
    }

    #[test]
    fn test_capacity_line_matches_display_rounding() {
        let mut ui = UiCoordinator::new();
        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        assert_eq!(
            ui.capacity_line().unwrap(),
            "Maximum capacity: 3.66 KB".to_string()
        );
    }

    #[test]
    fn test_submission_gated_on_both_files_and_validation() {
        let mut ui = UiCoordinator::new();
        assert!(!ui.can_submit());

        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        assert!(!ui.can_submit());

        // 100x100 capacity is 3750 bytes; a 4000-byte payload exceeds it.
        ui.set_payload(PayloadFile { size_bytes: 4000 });
        assert!(!ui.can_submit());
        assert!(ui.begin_submission().is_none());

        ui.set_payload(PayloadFile { size_bytes: 3750 });
        assert!(ui.can_submit());

        // Deselecting the payload closes the gate again.
        ui.clear_payload();
        assert!(!ui.can_submit());
        assert!(ui.begin_submission().is_none());
    }

    #[test]
    fn test_submissions_get_sequential_job_ids_and_reset_progress() {
        let mut ui = UiCoordinator::new();
        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        ui.set_payload(PayloadFile { size_bytes: 1000 });

        ui.apply_progress(ProgressEvent { progress: 55 });

        let first = ui.begin_submission().unwrap();
        assert_eq!(first.job_id, 1);
        assert_eq!(ui.progress_state().phase, Phase::Idle);
        assert_eq!(ui.progress_fill(), Some(0));

        let second = ui.begin_submission().unwrap();
        assert_eq!(second.job_id, 2);
    }

    #[test]
    fn test_progress_indicator_hidden_until_submission() {
        let mut ui = UiCoordinator::new();
        assert!(ui.progress_fill().is_none());
        assert!(ui.progress_label().is_none());

        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        ui.set_payload(PayloadFile { size_bytes: 1000 });
        ui.begin_submission().unwrap();

        assert_eq!(ui.progress_fill(), Some(0));
        assert_eq!(ui.progress_label().unwrap(), "0%");
    }

    #[test]
    fn test_progress_label_marks_a_lost_feed() {
        let mut ui = UiCoordinator::new();
        let token = ui.begin_cover_selection();
        ui.apply_cover_decode(token, cover_100x100());
        ui.set_payload(PayloadFile { size_bytes: 1000 });
        ui.begin_submission().unwrap();

        ui.apply_progress(ProgressEvent { progress: 42 });
        assert_eq!(ui.progress_label().unwrap(), "42%");

        ui.mark_feed_lost();
        assert_eq!(ui.progress_label().unwrap(), "42% (connection lost)");
        assert_eq!(ui.progress_fill(), Some(42));
    }

    #[tokio::test]
    async fn test_decode_cover_reads_dimensions_without_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        image::RgbImage::new(100, 100).save(&path).unwrap();

        let cover = decode_cover(&path).await.unwrap();
        assert_eq!(cover.width_px, 100);
        assert_eq!(cover.height_px, 100);
        assert!(cover.size_bytes > 0);
    }

    #[tokio::test]
    async fn test_inspect_payload_reports_byte_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.txt");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let payload = inspect_payload(&path).await.unwrap();
        assert_eq!(payload.size_bytes, 2048);
    }

    #[tokio::test]
    async fn test_decode_cover_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(decode_cover(&path).await.is_err());
    }
}
