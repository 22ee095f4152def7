#![forbid(unsafe_code)]

//! Image set loading: shuffle once, then wait for a usable subset.
//!
//! The loader is a join-with-timeout combinator over per-image completion
//! signals. Each image resolves exactly once to loaded, failed or timed out;
//! the batch completes when nothing is pending, or when the global deadline
//! passes with at least `min_images` loaded.
//!
//! # Design
//!
//! - [`shuffle`] is a plain Fisher–Yates pass over any slice with an
//!   injectable [`rand::Rng`], so tests can seed it.
//! - [`LoadBatch`] owns the handles in shuffled order plus one deadline per
//!   image and one global deadline. The host feeds it [`LoadSignal`]s as
//!   image events arrive and calls [`LoadBatch::poll`] with the current time
//!   so deadlines can fire. No timers are armed; time only moves when the
//!   host says so.
//! - [`LoadOutcome`] lists the usable handles (shuffled order, never load
//!   order) and the ids the host must hide.
//!
//! # Invariants
//!
//! 1. Once complete, a batch never changes: further signals are ignored.
//! 2. A failed image is never part of the loaded set and is never retried.
//! 3. An image that times out may still be upgraded to loaded by a late
//!    load signal, as long as the batch is not yet complete.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::{MarqueeError, Result};
use crate::image::{ImageHandle, ImageId, LoadState, MeasuredSize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timeouts and thresholds for a load batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// After this long an individual image is given up on.
    pub per_image_timeout_ms: u64,
    /// After this long the batch completes if `min_images` have loaded.
    pub global_timeout_ms: u64,
    /// Fewest loaded images that still make a marquee.
    pub min_images: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            per_image_timeout_ms: 5_000,
            global_timeout_ms: 10_000,
            min_images: 1,
        }
    }
}

impl LoaderConfig {
    #[must_use]
    pub fn per_image_timeout(&self) -> Duration {
        Duration::from_millis(self.per_image_timeout_ms)
    }

    #[must_use]
    pub fn global_timeout(&self) -> Duration {
        Duration::from_millis(self.global_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_images == 0 {
            return Err(MarqueeError::invalid_config(
                "loader.min_images",
                "must be at least 1",
            ));
        }
        if self.per_image_timeout_ms == 0 || self.global_timeout_ms == 0 {
            return Err(MarqueeError::invalid_config(
                "loader.timeouts",
                "timeouts must be nonzero",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shuffle
// ---------------------------------------------------------------------------

/// Uniform in-place Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

// ---------------------------------------------------------------------------
// Signals and outcome
// ---------------------------------------------------------------------------

/// Completion signal for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadSignal {
    Loaded(MeasuredSize),
    Failed,
}

/// Whether the batch is still waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Pending,
    Complete,
}

/// Final result of a load batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadOutcome {
    /// Loaded handles in shuffled order.
    pub loaded: Vec<ImageHandle>,
    /// Images that must be hidden so they leave no gap (failed or timed out).
    pub hidden: Vec<ImageId>,
}

impl LoadOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Loaded handles, or [`MarqueeError::NoImages`] when nothing made it.
    pub fn into_loaded(self) -> Result<Vec<ImageHandle>> {
        if self.loaded.is_empty() {
            Err(MarqueeError::NoImages)
        } else {
            Ok(self.loaded)
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    handle: ImageHandle,
    deadline: Duration,
}

/// Join-with-timeout over the per-image load signals of one discovery pass.
#[derive(Debug, Clone)]
pub struct LoadBatch {
    entries: Vec<Entry>,
    global_deadline: Duration,
    min_images: usize,
    outcome: Option<LoadOutcome>,
}

impl LoadBatch {
    /// Start waiting on `handles` (already in presentation order) at `now`.
    ///
    /// Handles that arrive with a nonzero intrinsic height count as loaded
    /// immediately. An empty set completes at once with an empty outcome.
    #[must_use]
    pub fn new(handles: Vec<ImageHandle>, now: Duration, config: &LoaderConfig) -> Self {
        let per_image = config.per_image_timeout();
        let entries = handles
            .into_iter()
            .map(|mut handle| {
                handle.state = if handle.size.has_intrinsic_size() {
                    LoadState::Loaded
                } else {
                    LoadState::Pending
                };
                Entry {
                    handle,
                    deadline: now.saturating_add(per_image),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            images = entries.len(),
            already_loaded = entries.iter().filter(|e| e.handle.is_loaded()).count(),
            "load batch started"
        );

        let mut batch = Self {
            entries,
            global_deadline: now.saturating_add(config.global_timeout()),
            min_images: config.min_images.max(1),
            outcome: None,
        };
        batch.evaluate(now);
        batch
    }

    /// Feed one image's completion signal.
    pub fn signal(
        &mut self,
        id: ImageId,
        signal: LoadSignal,
        now: Duration,
    ) -> Result<BatchStatus> {
        if self.outcome.is_some() {
            trace!(%id, "signal after batch completion ignored");
            return Ok(BatchStatus::Complete);
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.handle.id == id)
            .ok_or(MarqueeError::UnknownImage { id })?;

        match (signal, entry.handle.state) {
            (LoadSignal::Loaded(size), LoadState::Pending | LoadState::TimedOut) => {
                entry.handle.size = size;
                entry.handle.state = LoadState::Loaded;
                debug!(%id, width = size.resolved_width(), "image loaded");
            }
            (LoadSignal::Loaded(size), LoadState::Loaded) => {
                entry.handle.size = size;
            }
            (LoadSignal::Loaded(_), LoadState::Failed) => {
                trace!(%id, "load after failure ignored");
            }
            (LoadSignal::Failed, LoadState::Pending | LoadState::TimedOut) => {
                entry.handle.state = LoadState::Failed;
                warn!(%id, src = %entry.handle.src, "image failed to load");
            }
            (LoadSignal::Failed, LoadState::Loaded | LoadState::Failed) => {
                trace!(%id, "failure after settle ignored");
            }
        }

        Ok(self.evaluate(now))
    }

    /// Shorthand for [`LoadSignal::Loaded`].
    pub fn mark_loaded(
        &mut self,
        id: ImageId,
        size: MeasuredSize,
        now: Duration,
    ) -> Result<BatchStatus> {
        self.signal(id, LoadSignal::Loaded(size), now)
    }

    /// Shorthand for [`LoadSignal::Failed`].
    pub fn mark_failed(&mut self, id: ImageId, now: Duration) -> Result<BatchStatus> {
        self.signal(id, LoadSignal::Failed, now)
    }

    /// Let deadlines fire at `now`.
    pub fn poll(&mut self, now: Duration) -> BatchStatus {
        self.evaluate(now)
    }

    fn evaluate(&mut self, now: Duration) -> BatchStatus {
        if self.outcome.is_some() {
            return BatchStatus::Complete;
        }

        for entry in &mut self.entries {
            if entry.handle.state == LoadState::Pending && now >= entry.deadline {
                entry.handle.state = LoadState::TimedOut;
                warn!(id = %entry.handle.id, "image load timed out");
            }
        }

        let loaded = self.loaded_count();
        let all_accounted = self.pending_count() == 0;
        let global_expired = now >= self.global_deadline && loaded >= self.min_images;

        if all_accounted || global_expired {
            self.complete();
            BatchStatus::Complete
        } else {
            BatchStatus::Pending
        }
    }

    fn complete(&mut self) {
        let mut outcome = LoadOutcome::default();
        for entry in &mut self.entries {
            if entry.handle.state == LoadState::Pending {
                entry.handle.state = LoadState::TimedOut;
            }
            if entry.handle.is_loaded() {
                outcome.loaded.push(entry.handle.clone());
            } else {
                outcome.hidden.push(entry.handle.id);
            }
        }
        info!(
            loaded = outcome.loaded.len(),
            hidden = outcome.hidden.len(),
            "load batch complete"
        );
        self.outcome = Some(outcome);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }

    /// Take the outcome out of a completed batch.
    pub fn take_outcome(&mut self) -> Option<LoadOutcome> {
        self.outcome.take()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.handle.is_loaded()).count()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.handle.state.is_settled())
            .count()
    }

    #[must_use]
    pub fn state_of(&self, id: ImageId) -> Option<LoadState> {
        self.entries
            .iter()
            .find(|e| e.handle.id == id)
            .map(|e| e.handle.state)
    }

    /// Earliest instant at which [`poll`](Self::poll) could change anything.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.outcome.is_some() {
            return None;
        }
        self.entries
            .iter()
            .filter(|e| e.handle.state == LoadState::Pending)
            .map(|e| e.deadline)
            .chain(std::iter::once(self.global_deadline))
            .min()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
