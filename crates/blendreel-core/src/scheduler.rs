#![forbid(unsafe_code)]

//! Per-influence frame callback bookkeeping.
//!
//! Models the host's display-refresh callback for the three influences that
//! write the scroll offset. Each influence owns at most one pending callback:
//! [`FrameScheduler::schedule`] cancels whatever was pending for that
//! influence before arming a new one, and [`FrameScheduler::schedule_once`]
//! coalesces (a second request while one is pending is a no-op). Handles are
//! generation-stamped so a stale handle never runs.
//!
//! Nothing here runs callbacks; the motion controller takes due influences in
//! [`Influence::FRAME_ORDER`] while it processes a frame, which is what
//! guarantees wraparound is checked after the frame's momentum and autoplay
//! steps.

/// A writer of the shared scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Influence {
    Momentum,
    Autoplay,
    WrapCheck,
}

impl Influence {
    /// Order in which influences are serviced within one frame.
    pub const FRAME_ORDER: [Self; 3] = [Self::Momentum, Self::Autoplay, Self::WrapCheck];

    const fn index(self) -> usize {
        match self {
            Self::Momentum => 0,
            Self::Autoplay => 1,
            Self::WrapCheck => 2,
        }
    }
}

/// Token for one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle {
    pub influence: Influence,
    generation: u64,
}

/// Counters for logs and frame stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerCounters {
    pub scheduled: u64,
    pub cancelled: u64,
    pub coalesced: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    pending: [Option<FrameHandle>; 3],
    next_generation: u64,
    counters: SchedulerCounters,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a callback for `influence`, cancelling any pending one first.
    pub fn schedule(&mut self, influence: Influence) -> FrameHandle {
        if self.pending[influence.index()].is_some() {
            self.counters.cancelled += 1;
        }
        self.next_generation += 1;
        let handle = FrameHandle {
            influence,
            generation: self.next_generation,
        };
        self.pending[influence.index()] = Some(handle);
        self.counters.scheduled += 1;
        handle
    }

    /// Arm a callback unless one is already pending. Returns the pending handle.
    pub fn schedule_once(&mut self, influence: Influence) -> FrameHandle {
        match self.pending[influence.index()] {
            Some(handle) => {
                self.counters.coalesced += 1;
                handle
            }
            None => self.schedule(influence),
        }
    }

    /// Drop the pending callback for `influence`. Returns whether one existed.
    pub fn cancel(&mut self, influence: Influence) -> bool {
        let had = self.pending[influence.index()].take().is_some();
        if had {
            self.counters.cancelled += 1;
        }
        had
    }

    /// Consume the pending callback for `influence`, if any.
    pub fn take(&mut self, influence: Influence) -> Option<FrameHandle> {
        self.pending[influence.index()].take()
    }

    #[must_use]
    pub fn is_scheduled(&self, influence: Influence) -> bool {
        self.pending[influence.index()].is_some()
    }

    /// Whether `handle` is still the live callback for its influence.
    #[cfg(test)]
    #[must_use]
    pub fn is_current(&self, handle: FrameHandle) -> bool {
        self.pending[handle.influence.index()] == Some(handle)
    }

    /// Whether anything at all wants the next frame.
    #[cfg(test)]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(Option::is_some)
    }

    #[must_use]
    pub fn counters(&self) -> SchedulerCounters {
        self.counters
    }
}
