//! Image handles and their load/measurement state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width used when no measurement is usable.
pub const DEFAULT_IMAGE_WIDTH: f64 = 800.0;

/// Stable identity of a discovered image (its index in document order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load lifecycle of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
    /// Gave up waiting; counted as accounted for but not usable.
    TimedOut,
}

impl LoadState {
    /// Whether the loader no longer waits on this image.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Pixel measurements the host reports for an image.
///
/// Any field may be zero (not laid out yet, not decoded yet). The usable
/// width walks the chain rendered -> client -> natural -> default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasuredSize {
    pub rendered_width: f64,
    pub client_width: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl MeasuredSize {
    /// Size known only from the decoded source.
    #[must_use]
    pub const fn natural(width: f64, height: f64) -> Self {
        Self {
            rendered_width: 0.0,
            client_width: 0.0,
            natural_width: width,
            natural_height: height,
        }
    }

    /// Size as laid out by the host, with the same value for every width source.
    #[must_use]
    pub const fn uniform(width: f64, height: f64) -> Self {
        Self {
            rendered_width: width,
            client_width: width,
            natural_width: width,
            natural_height: height,
        }
    }

    /// Resolved horizontal extent used by layout.
    #[must_use]
    pub fn resolved_width(&self) -> f64 {
        [self.rendered_width, self.client_width, self.natural_width]
            .into_iter()
            .find(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_IMAGE_WIDTH)
    }

    /// An image counts as decoded once it reports a nonzero intrinsic height.
    #[must_use]
    pub fn has_intrinsic_size(&self) -> bool {
        self.natural_height.is_finite() && self.natural_height > 0.0
    }
}

/// An opaque renderable unit: source reference, measurements, load state and
/// the offset most recently assigned by layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub id: ImageId,
    pub src: String,
    pub size: MeasuredSize,
    pub state: LoadState,
    /// Horizontal offset within the unit, set by layout.
    pub offset: f64,
}

impl ImageHandle {
    #[must_use]
    pub fn new(id: ImageId, src: impl Into<String>) -> Self {
        Self {
            id,
            src: src.into(),
            size: MeasuredSize::default(),
            state: LoadState::Pending,
            offset: 0.0,
        }
    }

    /// Builder for a handle whose host element was already decoded at discovery.
    #[must_use]
    pub fn with_size(mut self, size: MeasuredSize) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.size.resolved_width()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }
}
