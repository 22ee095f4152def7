#![forbid(unsafe_code)]

//! Loop tripling: three identical units side by side.
//!
//! The region is described, not duplicated: an arena of [`LayoutRecord`]s
//! indexed by [`UnitSlot`], each pointing back at the source slot of the
//! [`StripUnit`]. The host materializes records however it likes (DOM clones,
//! GPU instances). Every record of the before/after units differs from its
//! middle twin only by `∓W`, where `W` is the unit width, which is what makes
//! wraparound invisible.
//!
//! Coordinates come in two flavours:
//! - **unit-relative** (`record.offset`): the middle unit starts at 0, the
//!   before unit at `-W`, the after unit at `+W`;
//! - **region** ([`LoopRegion::absolute_left`]): shifted by `+W` so the scroll
//!   container spans `[0, 3W)` and the middle unit starts at scroll offset `W`.

use tracing::debug;

use crate::layout::{BlendMode, Flip, StripUnit};

/// Which copy a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitSlot {
    Before,
    Middle,
    After,
}

impl UnitSlot {
    pub const ALL: [Self; 3] = [Self::Before, Self::Middle, Self::After];

    /// Multiple of the unit width this copy is shifted by.
    #[must_use]
    pub const fn shift(self) -> f64 {
        match self {
            Self::Before => -1.0,
            Self::Middle => 0.0,
            Self::After => 1.0,
        }
    }

    #[must_use]
    pub const fn is_clone(self) -> bool {
        !matches!(self, Self::Middle)
    }
}

/// One visual slot in the tripled region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRecord {
    pub unit: UnitSlot,
    /// Index into the source unit's slots.
    pub source: usize,
    /// Unit-relative left edge.
    pub offset: f64,
    pub width: f64,
    pub blend: BlendMode,
    pub flip: Flip,
}

/// Whether the unit width is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitReadiness {
    Pending,
    Ready(f64),
}

impl UnitReadiness {
    #[must_use]
    pub fn from_width(width: f64) -> Self {
        if width.is_finite() && width > 0.0 {
            Self::Ready(width)
        } else {
            Self::Pending
        }
    }

    #[must_use]
    pub fn width(self) -> Option<f64> {
        match self {
            Self::Ready(w) => Some(w),
            Self::Pending => None,
        }
    }

    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Three contiguous copies of one laid-out unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopRegion {
    records: Vec<LayoutRecord>,
    unit_len: usize,
    one_set_width: f64,
}

impl LoopRegion {
    /// Triple `unit`. Returns `None` while the unit width is not yet usable;
    /// the caller retries on a later frame.
    #[must_use]
    pub fn build(unit: &StripUnit) -> Option<Self> {
        let UnitReadiness::Ready(width) = UnitReadiness::from_width(unit.one_set_width()) else {
            debug!(images = unit.len(), "unit width not ready, deferring tripling");
            return None;
        };

        let mut records = Vec::with_capacity(unit.len() * 3);
        for slot in UnitSlot::ALL {
            let mut cursor = slot.shift() * width;
            for layout in unit.slots() {
                records.push(LayoutRecord {
                    unit: slot,
                    source: layout.index,
                    offset: cursor,
                    width: layout.width,
                    blend: layout.blend,
                    flip: unit.flip(),
                });
                cursor += layout.advance;
            }
        }

        debug!(
            slots = records.len(),
            one_set_width = width,
            total_width = width * 3.0,
            "loop region built"
        );

        Some(Self {
            records,
            unit_len: unit.len(),
            one_set_width: width,
        })
    }

    #[must_use]
    pub fn one_set_width(&self) -> f64 {
        self.one_set_width
    }

    #[must_use]
    pub fn readiness(&self) -> UnitReadiness {
        UnitReadiness::from_width(self.one_set_width)
    }

    /// Full scrollable width (`3 × W`).
    #[must_use]
    pub fn total_width(&self) -> f64 {
        self.one_set_width * 3.0
    }

    /// Scroll offset at which the middle unit starts.
    #[must_use]
    pub fn initial_scroll(&self) -> f64 {
        self.one_set_width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[LayoutRecord] {
        &self.records
    }

    /// Records of one copy, in source order.
    #[must_use]
    pub fn unit(&self, slot: UnitSlot) -> &[LayoutRecord] {
        let start = match slot {
            UnitSlot::Before => 0,
            UnitSlot::Middle => self.unit_len,
            UnitSlot::After => self.unit_len * 2,
        };
        &self.records[start..start + self.unit_len]
    }

    /// Left edge of `record` in scroll-container coordinates.
    #[must_use]
    pub fn absolute_left(&self, record: &LayoutRecord) -> f64 {
        record.offset + self.one_set_width
    }
}
