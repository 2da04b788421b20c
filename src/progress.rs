//! # Embedding Progress Channel
//!
//! Tracks the server-reported progress of one embedding job.
//!
//! The server pushes progress events over a persistent connection while it
//! works; this module owns the last-known progress state and nothing else. It
//! is deliberately passive: it never initiates requests, it only reacts to
//! events handed to it.
//!
//! ## Transition Rule
//!
//! On every event `{progress: p}`: `phase` becomes `Running` and `percent`
//! becomes `p`; when `p == 100` the phase becomes `Complete`. Events may
//! arrive duplicated or out of numeric order (retransmits); the channel does
//! NOT enforce monotonicity. The latest received value simply wins, because
//! the UI only mirrors what the server currently reports.
//!
//! ## Feed Loss
//!
//! When the event stream ends before completion the channel keeps the last
//! value visible (a 97% job that lost its connection should not pretend it
//! never started) and records the loss in a flag the UI can render as a
//! "connection lost" indicator. A new submission resets everything to `Idle`.
//!
//! ## Event Sources
//!
//! Sources implement [`ProgressFeed`], an injected seam rather than an
//! ambient connection singleton: the client wires a TCP-backed feed, tests
//! substitute [`ScriptedFeed`].

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::common::messages::JobId;

/// Capacity of a subscriber channel. Events are tiny and consumed promptly;
/// this only buffers bursts.
const FEED_BUFFER: usize = 100;

/// A single progress event pushed by the server. The wire contract carries
/// exactly one field: the completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion percentage in `[0, 100]`
    pub progress: u8,
}

/// Lifecycle phase of the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No submission in flight (page-load state, or reset for a new one)
    Idle,
    /// At least one progress event has arrived
    Running,
    /// The server reported 100%
    Complete,
}

/// Last-known progress of the current job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    /// Latest reported percentage, always in `[0, 100]`
    pub percent: u8,
    /// Current lifecycle phase
    pub phase: Phase,
}

/// Owns and mutates [`ProgressState`] in response to inbound events.
///
/// Exactly one writer exists (whoever drains the feed); everything else reads
/// copies of the state for rendering.
#[derive(Debug)]
pub struct ProgressChannel {
    state: ProgressState,
    feed_lost: bool,
}

impl ProgressChannel {
    pub fn new() -> Self {
        Self {
            state: ProgressState {
                percent: 0,
                phase: Phase::Idle,
            },
            feed_lost: false,
        }
    }

    /// Apply one inbound event.
    ///
    /// Last-write-wins: the percentage is overwritten unconditionally, even
    /// when it moves backwards or repeats. Values above 100 are capped so the
    /// percent invariant holds even against a misbehaving sender.
    pub fn apply(&mut self, event: ProgressEvent) {
        let percent = event.progress.min(100);
        self.state.percent = percent;
        self.state.phase = if percent == 100 {
            Phase::Complete
        } else {
            Phase::Running
        };
    }

    /// Record that the event stream ended before the job completed.
    ///
    /// The last value stays visible; completion clears nothing.
    pub fn mark_feed_lost(&mut self) {
        if self.state.phase != Phase::Complete {
            self.feed_lost = true;
        }
    }

    pub fn feed_lost(&self) -> bool {
        self.feed_lost
    }

    /// Reset for a new submission: back to `Idle` at 0%, feed-loss cleared.
    pub fn reset(&mut self) {
        self.state = ProgressState {
            percent: 0,
            phase: Phase::Idle,
        };
        self.feed_lost = false;
    }

    /// Copy of the last-known state, for rendering.
    pub fn state(&self) -> ProgressState {
        self.state
    }
}

/// Source of progress events for submitted jobs.
///
/// Injected wherever progress is consumed so the transport can be swapped out
/// in tests. `subscribe` hands back the receiving end of a channel; the feed
/// closes the sender when the underlying stream ends, which is how a
/// subscriber detects feed loss.
pub trait ProgressFeed: Send + Sync {
    /// Subscribe to the progress events of one submitted job.
    ///
    /// The receiver closes when the job's event stream ends; a close before
    /// a terminal `100` is how subscribers observe feed loss.
    fn subscribe(&self, job_id: JobId) -> mpsc::Receiver<ProgressEvent>;
}

/// Replays scripted percent sequences, for tests and offline demos.
pub struct ScriptedFeed {
    scripts: Mutex<HashMap<JobId, Vec<u8>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
        }
    }

    /// Queue the percent sequence to replay for `job_id`.
    pub fn script(&self, job_id: JobId, percents: Vec<u8>) {
        self.scripts.lock().unwrap().insert(job_id, percents);
    }
}

impl ProgressFeed for ScriptedFeed {
    /// Unscripted job ids yield an already-closed receiver.
    fn subscribe(&self, job_id: JobId) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);

        if let Some(percents) = self.scripts.lock().unwrap().remove(&job_id) {
            tokio::spawn(async move {
                for progress in percents {
                    if tx.send(ProgressEvent { progress }).await.is_err() {
                        break;
                    }
                }
                // Sender drops here; the subscriber sees the stream end.
            });
        }

        rx
    }
}
