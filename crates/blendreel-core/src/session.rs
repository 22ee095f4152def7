#![forbid(unsafe_code)]

//! One marquee instance, from image discovery to steady-state motion.
//!
//! [`MarqueeSession`] is the single owner of everything the effect needs:
//! the load batch, the laid-out unit, the tripled region, the motion
//! controller and the ambient embellishments. The host drives it with three
//! kinds of calls and nothing else:
//!
//! - load signals ([`MarqueeSession::image_loaded`],
//!   [`MarqueeSession::image_failed`]),
//! - input ([`MarqueeSession::input`]),
//! - frame ticks ([`MarqueeSession::frame`]) carrying the current time.
//!
//! Discrete changes the host has to materialize (hide these images, apply
//! this layout, clone these units) are reported as [`SessionEvent`]s in the
//! [`SessionFrame`] of the tick on which they happen.
//!
//! # Phases
//!
//! ```text
//! Idle --discover--> Loading --batch complete--> Running
//!                       |                           ^
//!                       +--nothing loaded--> Skipped
//! ```
//!
//! `Skipped` is terminal: the container never becomes interactive. The
//! ambient circles and the cursor disc keep running in every phase.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::ambient::{AutoBlendField, Viewport};
use crate::config::MarqueeConfig;
use crate::cursor::{CursorFollower, SpotlightMode, SpotlightSelector, SpotlightUniforms};
use crate::error::{MarqueeError, Result};
use crate::frame_stats::{FrameTraceCollector, MotionFrameStats, jsonl_lines};
use crate::image::{ImageHandle, ImageId, MeasuredSize};
use crate::input::{InputEvent, PointerPhase, TouchPhase};
use crate::layout::{Flip, StripUnit, layout_strip};
use crate::loader::{BatchStatus, LoadBatch, shuffle};
use crate::motion::{MotionController, MotionSnapshot};
use crate::tripler::LoopRegion;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Nothing discovered yet.
    Idle,
    Loading,
    Running,
    /// No usable images; the effect is off for good.
    Skipped,
}

impl SessionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Running => "running",
            Self::Skipped => "skipped",
        }
    }
}

/// A discrete change the host must apply.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Loading finished. `hidden` images failed or timed out.
    LoadComplete { loaded: usize, hidden: Vec<ImageId> },
    /// The unit is laid out; read it from [`MarqueeSession::unit`].
    LayoutReady { one_set_width: f64, flip: Flip },
    /// The tripled region exists and motion may start; read it from
    /// [`MarqueeSession::region`].
    RegionReady { total_width: f64, initial_scroll: f64 },
    Skipped,
    SpotlightChosen(SpotlightMode),
}

/// Output of one [`MarqueeSession::frame`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFrame {
    pub phase: SessionPhase,
    /// Present once the session is running.
    pub motion: Option<MotionSnapshot>,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone)]
pub struct MarqueeSession {
    config: MarqueeConfig,
    rng: SmallRng,
    phase: SessionPhase,
    batch: Option<LoadBatch>,
    unit: Option<StripUnit>,
    region: Option<LoopRegion>,
    hidden: Vec<ImageId>,
    motion: MotionController,
    viewport: Viewport,
    ambient: AutoBlendField,
    cursor: CursorFollower,
    spotlight: SpotlightUniforms,
    selector: SpotlightSelector,
    trace: FrameTraceCollector,
    pending_events: Vec<SessionEvent>,
}

impl MarqueeSession {
    /// New idle session. `seed` drives the shuffle, the flip and the ambient
    /// circles, so equal seeds give equal sessions.
    ///
    /// The config is validated here; code-built configs never pass through
    /// [`MarqueeConfig::from_json_str`].
    pub fn new(config: MarqueeConfig, viewport: Viewport, seed: u64) -> Result<Self> {
        Self::with_rng(config, viewport, SmallRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: MarqueeConfig, viewport: Viewport, rng: SmallRng) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, viewport, rng))
    }

    /// Session with the default config, which always validates.
    #[must_use]
    pub fn with_defaults(viewport: Viewport, seed: u64) -> Self {
        Self::build(MarqueeConfig::default(), viewport, SmallRng::seed_from_u64(seed))
    }

    fn build(config: MarqueeConfig, viewport: Viewport, mut rng: SmallRng) -> Self {
        let ambient = AutoBlendField::new(config.ambient.clone(), viewport, &mut rng);
        Self {
            motion: MotionController::new(config.motion.clone()),
            cursor: CursorFollower::new(&config.cursor),
            spotlight: SpotlightUniforms::new(&config.cursor, viewport),
            selector: SpotlightSelector::new(&config.cursor),
            trace: FrameTraceCollector::new("session"),
            rng,
            phase: SessionPhase::Idle,
            batch: None,
            unit: None,
            region: None,
            hidden: Vec::new(),
            viewport,
            ambient,
            pending_events: Vec::new(),
            config,
        }
    }

    // -- accessors --

    #[must_use]
    pub fn config(&self) -> &MarqueeConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn unit(&self) -> Option<&StripUnit> {
        self.unit.as_ref()
    }

    #[must_use]
    pub fn region(&self) -> Option<&LoopRegion> {
        self.region.as_ref()
    }

    /// Images the host must hide.
    #[must_use]
    pub fn hidden(&self) -> &[ImageId] {
        &self.hidden
    }

    #[must_use]
    pub fn batch(&self) -> Option<&LoadBatch> {
        self.batch.as_ref()
    }

    #[must_use]
    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    #[must_use]
    pub fn ambient(&self) -> &AutoBlendField {
        &self.ambient
    }

    #[must_use]
    pub fn cursor(&self) -> &CursorFollower {
        &self.cursor
    }

    #[must_use]
    pub fn spotlight(&self) -> &SpotlightUniforms {
        &self.spotlight
    }

    #[must_use]
    pub fn spotlight_mode(&self) -> Option<SpotlightMode> {
        self.selector.mode()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn frame_trace(&self) -> &FrameTraceCollector {
        &self.trace
    }

    // -- loading --

    /// Register the images found in the host document (document order) and
    /// start waiting for them.
    ///
    /// An empty set skips the session and returns [`MarqueeError::NoImages`].
    pub fn discover(&mut self, mut handles: Vec<ImageHandle>, now: Duration) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            return Err(MarqueeError::AlreadyStarted);
        }
        if handles.is_empty() {
            self.skip();
            return Err(MarqueeError::NoImages);
        }

        shuffle(&mut handles, &mut self.rng);
        info!(images = handles.len(), "images discovered");
        let batch = LoadBatch::new(handles, now, &self.config.loader);
        let complete = batch.is_complete();
        self.batch = Some(batch);
        self.phase = SessionPhase::Loading;
        if complete {
            self.finish_loading(now);
        }
        self.skipped_as_error()
    }

    pub fn image_loaded(&mut self, id: ImageId, size: MeasuredSize, now: Duration) -> Result<()> {
        self.signal(now, |batch| batch.mark_loaded(id, size, now))
    }

    pub fn image_failed(&mut self, id: ImageId, now: Duration) -> Result<()> {
        self.signal(now, |batch| batch.mark_failed(id, now))
    }

    fn signal(
        &mut self,
        now: Duration,
        apply: impl FnOnce(&mut LoadBatch) -> Result<BatchStatus>,
    ) -> Result<()> {
        match self.phase {
            SessionPhase::Idle => Err(MarqueeError::NotReady { what: "load batch" }),
            SessionPhase::Running | SessionPhase::Skipped => {
                trace!("load signal after loading finished ignored");
                Ok(())
            }
            SessionPhase::Loading => {
                let batch = self
                    .batch
                    .as_mut()
                    .ok_or(MarqueeError::NotReady { what: "load batch" })?;
                if apply(batch)? == BatchStatus::Complete {
                    self.finish_loading(now);
                }
                self.skipped_as_error()
            }
        }
    }

    /// The call that ends loading with nothing usable reports it once.
    fn skipped_as_error(&self) -> Result<()> {
        if self.phase == SessionPhase::Skipped {
            Err(MarqueeError::NoImages)
        } else {
            Ok(())
        }
    }

    fn finish_loading(&mut self, now: Duration) {
        let outcome = self
            .batch
            .as_mut()
            .and_then(LoadBatch::take_outcome)
            .unwrap_or_default();

        self.hidden = outcome.hidden.clone();
        self.pending_events.push(SessionEvent::LoadComplete {
            loaded: outcome.loaded.len(),
            hidden: outcome.hidden.clone(),
        });

        let images = match outcome.into_loaded() {
            Ok(images) => images,
            Err(_) => {
                warn!("no image loaded, marquee skipped");
                self.skip();
                return;
            }
        };

        let flip = Flip::from_bool(self.rng.random_bool(self.config.layout.flip_probability));
        let unit = match layout_strip(images, self.config.layout.overlap_ratio, flip) {
            Ok(unit) => unit,
            Err(err) => {
                warn!(%err, "layout failed, marquee skipped");
                self.skip();
                return;
            }
        };
        self.pending_events.push(SessionEvent::LayoutReady {
            one_set_width: unit.one_set_width(),
            flip,
        });
        self.unit = Some(unit);
        self.phase = SessionPhase::Running;
        self.selector.start(now);
        info!(images = self.unit.as_ref().map_or(0, StripUnit::len), "marquee running");

        self.try_build_region();
        if self.region.is_none() {
            warn!("unit width not ready, tripling deferred to a later frame");
        }
    }

    fn try_build_region(&mut self) {
        if self.region.is_some() {
            return;
        }
        let Some(region) = self.unit.as_ref().and_then(LoopRegion::build) else {
            return;
        };
        self.pending_events.push(SessionEvent::RegionReady {
            total_width: region.total_width(),
            initial_scroll: region.initial_scroll(),
        });
        self.motion.on_unit_ready(region.one_set_width());
        self.region = Some(region);
    }

    fn skip(&mut self) {
        self.phase = SessionPhase::Skipped;
        self.pending_events.push(SessionEvent::Skipped);
        info!("marquee skipped");
    }

    // -- input --

    /// Apply one input event. Returns `true` when the host should suppress
    /// the event's default action.
    pub fn input(&mut self, event: InputEvent) -> bool {
        if event.affects_motion() && !self.is_interactive() {
            trace!("motion input before the region is ready ignored");
            return false;
        }
        match event {
            InputEvent::Wheel(wheel) => {
                self.motion.wheel(wheel.dy);
                true
            }
            InputEvent::Touch(touch) => match touch.phase {
                TouchPhase::Start => {
                    self.motion.touch_start(touch.x, touch.y, touch.time_ms);
                    false
                }
                TouchPhase::Move => self.motion.touch_move(touch.x, touch.y, touch.time_ms),
                TouchPhase::End | TouchPhase::Cancel => {
                    self.motion.touch_end();
                    false
                }
            },
            InputEvent::Scroll(scroll) => {
                self.motion.sync_scroll(scroll.scroll_left);
                false
            }
            InputEvent::Pointer(pointer) => {
                match pointer.phase {
                    PointerPhase::Move => {
                        self.cursor.pointer_move(pointer.x, pointer.y);
                        self.spotlight.pointer_move(pointer.x, pointer.y, self.viewport);
                    }
                    PointerPhase::Leave => self.cursor.pointer_leave(),
                    PointerPhase::Enter => self.cursor.pointer_enter(),
                }
                false
            }
            InputEvent::Hover(inside) => {
                self.cursor.set_hovering(inside);
                false
            }
            InputEvent::Resize(viewport) => {
                self.resize(viewport);
                false
            }
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
        self.viewport = viewport;
        self.ambient.resize(viewport);
        self.spotlight.resize(viewport);
    }

    pub fn set_shader_available(&mut self, available: bool) {
        self.selector.set_shader_available(available);
    }

    pub fn set_autoplay_enabled(&mut self, enabled: bool) {
        self.motion.set_autoplay_enabled(enabled);
    }

    fn is_interactive(&self) -> bool {
        self.phase == SessionPhase::Running && self.region.is_some()
    }

    // -- frame --

    /// Advance one display frame at `now`.
    pub fn frame(&mut self, now: Duration) -> SessionFrame {
        if self.phase == SessionPhase::Loading {
            let complete = self
                .batch
                .as_mut()
                .is_some_and(|batch| batch.poll(now) == BatchStatus::Complete);
            if complete {
                self.finish_loading(now);
            }
        }

        let motion = if self.phase == SessionPhase::Running {
            self.try_build_region();
            let snapshot = self.motion.frame();
            if snapshot.unit_width.is_some() {
                self.ambient.on_scroll(snapshot.offset);
            }
            self.trace.record(MotionFrameStats::from(&snapshot));
            if let Some(mode) = self.selector.poll(now) {
                self.pending_events.push(SessionEvent::SpotlightChosen(mode));
            }
            Some(snapshot)
        } else {
            None
        };

        self.ambient.step(&mut self.rng);
        self.cursor.step();
        self.spotlight.step();

        SessionFrame {
            phase: self.phase,
            motion,
            events: std::mem::take(&mut self.pending_events),
        }
    }

    /// Drain recorded frame stats as JSONL lines tagged with `run_id`.
    pub fn drain_frame_stats(&mut self, run_id: &str) -> Vec<String> {
        let records = self.trace.drain();
        jsonl_lines(run_id, &records)
    }
}
