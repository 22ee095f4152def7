#![forbid(unsafe_code)]

//! Strip layout: horizontal offsets, blend modes and the unit width.
//!
//! Images overlap their predecessor by a fixed fraction of their own width.
//! With overlap ratio `r`, each image advances the cursor by
//! `width × (1 − r)`; the first image sits at 0.
//!
//! The width of one repeating unit is the sum of every advance except the
//! last, plus the last image's trailing overlap (`width × r`): nothing follows
//! the last image inside the unit, the next unit's first image does.
//!
//! Blend modes are a pure function of slot index, and the vertical flip is a
//! single session-wide choice passed in by the caller, so laying out the same
//! ordered images twice yields identical results.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MarqueeError, Result};
use crate::image::ImageHandle;

/// `mix-blend-mode` applied to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    ColorDodge,
    ColorBurn,
}

/// Cyclic palette for every slot after the first.
pub const BLEND_PALETTE: [BlendMode; 7] = [
    BlendMode::Multiply,
    BlendMode::Screen,
    BlendMode::Overlay,
    BlendMode::SoftLight,
    BlendMode::HardLight,
    BlendMode::ColorDodge,
    BlendMode::ColorBurn,
];

impl BlendMode {
    /// Blend mode for slot `index` of a unit.
    #[must_use]
    pub const fn for_slot(index: usize) -> Self {
        if index == 0 {
            Self::Normal
        } else {
            BLEND_PALETTE[index % BLEND_PALETTE.len()]
        }
    }

    /// CSS keyword.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::SoftLight => "soft-light",
            Self::HardLight => "hard-light",
            Self::ColorDodge => "color-dodge",
            Self::ColorBurn => "color-burn",
        }
    }
}

/// Session-wide vertical orientation of every image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flip {
    #[default]
    Upright,
    Vertical,
}

impl Flip {
    #[must_use]
    pub const fn from_bool(flipped: bool) -> Self {
        if flipped { Self::Vertical } else { Self::Upright }
    }

    /// CSS `transform` value, if any.
    #[must_use]
    pub const fn css_transform(self) -> Option<&'static str> {
        match self {
            Self::Upright => None,
            Self::Vertical => Some("scaleY(-1)"),
        }
    }
}

/// Layout knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Fraction of each image hidden under its successor.
    pub overlap_ratio: f64,
    /// Chance that the session flips every image vertically.
    pub flip_probability: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            overlap_ratio: 0.5,
            flip_probability: 0.5,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(MarqueeError::invalid_config(
                "layout.overlap_ratio",
                format!("{} is outside [0, 1)", self.overlap_ratio),
            ));
        }
        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(MarqueeError::invalid_config(
                "layout.flip_probability",
                format!("{} is outside [0, 1]", self.flip_probability),
            ));
        }
        Ok(())
    }
}

/// Placement of one image inside a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotLayout {
    pub index: usize,
    pub offset: f64,
    pub width: f64,
    pub advance: f64,
    pub blend: BlendMode,
}

/// One non-repeating cycle of the marquee.
#[derive(Debug, Clone, PartialEq)]
pub struct StripUnit {
    images: Vec<ImageHandle>,
    slots: Vec<SlotLayout>,
    flip: Flip,
    overlap_ratio: f64,
    one_set_width: f64,
}

impl StripUnit {
    #[must_use]
    pub fn images(&self) -> &[ImageHandle] {
        &self.images
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotLayout] {
        &self.slots
    }

    #[must_use]
    pub fn flip(&self) -> Flip {
        self.flip
    }

    #[must_use]
    pub fn overlap_ratio(&self) -> f64 {
        self.overlap_ratio
    }

    /// Width of one repeating unit.
    #[must_use]
    pub fn one_set_width(&self) -> f64 {
        self.one_set_width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate `(handle, slot)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&ImageHandle, &SlotLayout)> {
        self.images.iter().zip(self.slots.iter())
    }
}

/// Lay out an ordered, non-empty list of loaded images.
///
/// Each handle's `offset` is updated in the returned unit.
pub fn layout_strip(
    images: Vec<ImageHandle>,
    overlap_ratio: f64,
    flip: Flip,
) -> Result<StripUnit> {
    if images.is_empty() {
        return Err(MarqueeError::NoImages);
    }
    let keep = 1.0 - overlap_ratio;

    let mut images = images;
    let mut slots = Vec::with_capacity(images.len());
    let mut cursor = 0.0;
    for (index, image) in images.iter_mut().enumerate() {
        let width = image.width();
        let advance = width * keep;
        image.offset = cursor;
        slots.push(SlotLayout {
            index,
            offset: cursor,
            width,
            advance,
            blend: BlendMode::for_slot(index),
        });
        cursor += advance;
    }

    let one_set_width = match slots.split_last() {
        Some((last, rest)) => {
            rest.iter().map(|s| s.advance).sum::<f64>() + last.width * overlap_ratio
        }
        None => 0.0,
    };

    debug!(
        images = slots.len(),
        one_set_width,
        flip = ?flip,
        "strip laid out"
    );

    Ok(StripUnit {
        images,
        slots,
        flip,
        overlap_ratio,
        one_set_width,
    })
}
