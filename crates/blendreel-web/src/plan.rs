#![forbid(unsafe_code)]

//! Host-agnostic description of the DOM writes a session needs.
//!
//! The wasm layer never reads layout state directly. It turns
//! [`SessionEvent`]s into a [`DomPlan`] once, then applies per-frame
//! [`FrameWrites`] filtered through a [`WriteCache`] so unchanged values
//! never touch the style system.
//!
//! # Invariants
//!
//! - Originals are positioned at `offset + W` inside the wrapper, so the
//!   before copy occupies `[0, W)` and the after copy `[2W, 3W)`.
//! - Clone order matches the unit order; the host inserts the before copy
//!   ahead of the first original and appends the after copy.

use blendreel_core::session::{MarqueeSession, SessionEvent};
use blendreel_core::tripler::LayoutRecord;
use blendreel_core::motion::MotionBlur;
use blendreel_core::{ImageId, MotionSnapshot, UnitSlot};
use serde::Serialize;

/// Inline style for one image node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStyle {
    pub left_px: f64,
    pub blend: &'static str,
    pub transform: Option<&'static str>,
}

impl SlotStyle {
    fn from_record(record: &LayoutRecord, one_set_width: f64) -> Self {
        Self {
            left_px: record.offset + one_set_width,
            blend: record.blend.css_name(),
            transform: record.flip.css_transform(),
        }
    }

    /// `(property, value)` pairs to set. A missing transform clears it.
    #[must_use]
    pub fn properties(&self) -> [(&'static str, String); 3] {
        [
            ("left", format!("{}px", self.left_px)),
            ("mix-blend-mode", self.blend.to_string()),
            ("transform", self.transform.unwrap_or("none").to_string()),
        ]
    }
}

/// A node to clone from an original and where it goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOp {
    pub source: ImageId,
    #[serde(skip)]
    pub slot: UnitSlot,
    pub style: SlotStyle,
}

/// Every structural write for a running marquee.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomPlan {
    pub originals: Vec<(ImageId, SlotStyle)>,
    pub hidden: Vec<ImageId>,
    pub before: Vec<CloneOp>,
    pub after: Vec<CloneOp>,
    pub wrapper_width: f64,
    pub initial_scroll: f64,
}

impl DomPlan {
    /// Build the plan from a session whose region exists.
    #[must_use]
    pub fn from_session(session: &MarqueeSession) -> Option<Self> {
        let unit = session.unit()?;
        let region = session.region()?;
        let w = region.one_set_width();
        let images = unit.images();

        let mut originals = Vec::new();
        let mut before = Vec::new();
        let mut after = Vec::new();
        for record in region.records() {
            let Some(image) = images.get(record.source) else {
                continue;
            };
            let style = SlotStyle::from_record(record, w);
            if !record.unit.is_clone() {
                originals.push((image.id, style));
                continue;
            }
            let op = CloneOp {
                source: image.id,
                slot: record.unit,
                style,
            };
            match record.unit {
                UnitSlot::Before => before.push(op),
                _ => after.push(op),
            }
        }

        Some(Self {
            originals,
            hidden: session.hidden().to_vec(),
            before,
            after,
            wrapper_width: region.total_width(),
            initial_scroll: region.initial_scroll(),
        })
    }

    /// Number of nodes the wrapper holds once the plan is applied.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.originals.len() + self.before.len() + self.after.len()
    }
}

/// What a session frame asks of the DOM.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameWrites {
    /// Images to hide now.
    pub hide: Vec<ImageId>,
    /// The region became ready; apply the full plan.
    pub apply_plan: bool,
    pub scroll_left: Option<f64>,
    pub blur_px: Option<f64>,
    /// Motion is still settling; the host should keep requesting frames.
    pub animating: bool,
}

impl FrameWrites {
    #[must_use]
    pub fn collect(events: &[SessionEvent], motion: Option<&MotionSnapshot>) -> Self {
        let mut writes = Self::default();
        for event in events {
            match event {
                SessionEvent::LoadComplete { hidden, .. } => writes.hide.extend(hidden),
                SessionEvent::RegionReady { .. } => writes.apply_plan = true,
                _ => {}
            }
        }
        if let Some(m) = motion.filter(|m| m.unit_width.is_some()) {
            writes.scroll_left = Some(m.offset);
            writes.blur_px = Some(m.blur);
            writes.animating = m.is_animating();
        }
        writes
    }

    /// Whether loading ended with nothing usable on this frame.
    #[must_use]
    pub fn skipped(events: &[SessionEvent]) -> bool {
        events.iter().any(|e| matches!(e, SessionEvent::Skipped))
    }
}

/// Last values written, so repeated frames are free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteCache {
    scroll_left: Option<i32>,
    filter: Option<String>,
}

impl WriteCache {
    /// Whole-pixel `scrollLeft` to write, if it changed.
    pub fn scroll(&mut self, offset: f64) -> Option<i32> {
        let px = offset.round() as i32;
        if self.scroll_left == Some(px) {
            return None;
        }
        self.scroll_left = Some(px);
        Some(px)
    }

    /// The wrapper's `filter` value, if it changed.
    pub fn filter(&mut self, blur_px: f64) -> Option<String> {
        let value = MotionBlur::css_filter_for(blur_px);
        if self.filter.as_deref() == Some(value.as_str()) {
            return None;
        }
        self.filter = Some(value.clone());
        Some(value)
    }

    /// Forget everything, e.g. after the host rewrote the container.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blendreel_core::ambient::Viewport;
    use blendreel_core::{BlendMode, ImageHandle, MeasuredSize};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn running(widths: &[f64]) -> MarqueeSession {
        let mut session = MarqueeSession::with_defaults(Viewport::default(), 11);
        let handles = (0..widths.len() as u32)
            .map(|i| ImageHandle::new(ImageId(i), format!("{i}.jpg")))
            .collect();
        session.discover(handles, Duration::ZERO).unwrap();
        for (i, w) in widths.iter().enumerate() {
            session
                .image_loaded(ImageId(i as u32), MeasuredSize::uniform(*w, 500.0), Duration::ZERO)
                .unwrap();
        }
        session
    }

    #[test]
    fn plan_places_originals_in_the_middle_unit() {
        let session = running(&[800.0, 800.0, 800.0]);
        let plan = DomPlan::from_session(&session).unwrap();

        assert_eq!(plan.wrapper_width, 3.0 * 1200.0);
        assert_eq!(plan.initial_scroll, 1200.0);
        let lefts: Vec<f64> = plan.originals.iter().map(|(_, s)| s.left_px).collect();
        assert_eq!(lefts, vec![1200.0, 1600.0, 2000.0]);
        assert_eq!(plan.originals[0].1.blend, BlendMode::Normal.css_name());
    }

    #[test]
    fn clones_mirror_originals_one_unit_apart() {
        let session = running(&[600.0, 400.0]);
        let plan = DomPlan::from_session(&session).unwrap();
        let w = plan.initial_scroll;

        assert_eq!(plan.node_count(), 6);
        for ((id, style), (before, after)) in plan
            .originals
            .iter()
            .zip(plan.before.iter().zip(&plan.after))
        {
            assert_eq!(before.source, *id);
            assert_eq!(after.source, *id);
            assert_eq!(before.style.left_px, style.left_px - w);
            assert_eq!(after.style.left_px, style.left_px + w);
            assert_eq!(before.style.blend, style.blend);
        }
    }

    #[test]
    fn no_plan_before_running() {
        let session = MarqueeSession::with_defaults(Viewport::default(), 1);
        assert_eq!(DomPlan::from_session(&session), None);
    }

    #[test]
    fn style_properties_clear_missing_transform() {
        let style = SlotStyle {
            left_px: 12.5,
            blend: "screen",
            transform: None,
        };
        assert_eq!(
            style.properties(),
            [
                ("left", "12.5px".to_string()),
                ("mix-blend-mode", "screen".to_string()),
                ("transform", "none".to_string()),
            ]
        );
    }

    #[test]
    fn writes_collect_hidden_and_region() {
        let events = vec![
            SessionEvent::LoadComplete {
                loaded: 2,
                hidden: vec![ImageId(4)],
            },
            SessionEvent::RegionReady {
                total_width: 300.0,
                initial_scroll: 100.0,
            },
        ];
        let writes = FrameWrites::collect(&events, None);
        assert_eq!(writes.hide, vec![ImageId(4)]);
        assert!(writes.apply_plan);
        assert_eq!(writes.scroll_left, None);
        assert!(!writes.animating);
    }

    #[test]
    fn writes_follow_running_motion() {
        let mut session = running(&[800.0, 800.0]);
        let frame = session.frame(Duration::from_millis(16));
        let writes = FrameWrites::collect(&frame.events, frame.motion.as_ref());

        assert!(writes.scroll_left.is_some());
        assert_eq!(writes.animating, frame.motion.is_some_and(|m| m.is_animating()));
        assert!(writes.animating, "autoplay keeps the marquee moving");
    }

    #[test]
    fn cache_skips_repeated_values() {
        let mut cache = WriteCache::default();
        assert_eq!(cache.scroll(1200.4), Some(1200));
        assert_eq!(cache.scroll(1199.6), None);
        assert_eq!(cache.scroll(1203.0), Some(1203));

        assert_eq!(cache.filter(0.0), Some("none".to_string()));
        assert_eq!(cache.filter(0.0), None);
        assert_eq!(cache.filter(1.5), Some(MotionBlur::css_filter_for(1.5)));

        cache.reset();
        assert_eq!(cache.filter(0.0), Some("none".to_string()));
    }
}
