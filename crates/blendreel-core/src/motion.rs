#![forbid(unsafe_code)]

//! Scroll motion: autoplay drift, momentum and wraparound on one offset.
//!
//! This module owns the marquee's scroll offset and reconciles the three
//! influences that write it. It does **not** touch the host's scroll
//! container; the host reads a [`MotionSnapshot`] each frame and applies it.
//!
//! # Design
//!
//! - [`MotionConfig`] holds tuning parameters (friction, velocity bounds,
//!   autoplay speed, blur response, input gains).
//! - [`MotionController`] owns a [`MotionState`] plus a [`FrameScheduler`].
//!   Input handlers mutate state immediately; [`MotionController::frame`]
//!   services due influences in a fixed order: momentum, autoplay, then the
//!   coalesced wraparound check, then the blur feedback loop.
//! - [`MotionBlur`] is a first-order low-pass on a velocity-derived target,
//!   clamped to exactly zero below a floor.
//! - [`TouchTracker`] turns touch samples into scroll deltas and a
//!   per-frame velocity estimate.
//!
//! # Invariants
//!
//! 1. After a frame, the offset lies in `[0, 2W)` where `W` is the unit width.
//! 2. Momentum decays geometrically (`v ← v × friction`) and stops the frame
//!    `|v|` first drops below `min_velocity`.
//! 3. Input-seeded velocity is clamped to `±max_velocity`.
//! 4. At most one callback per influence is pending; starting an influence
//!    cancels its previous callback.
//! 5. Nothing moves until the unit width is known; autoplay requested
//!    earlier starts on the readiness signal.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{MarqueeError, Result};
use crate::scheduler::{FrameScheduler, Influence, SchedulerCounters};
use crate::tripler::UnitReadiness;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for marquee motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Per-frame velocity decay factor (0.0 = instant stop, 1.0 = no friction).
    pub friction: f64,
    /// Velocity below which momentum stops (px/frame).
    pub min_velocity: f64,
    /// Input-seeded velocity is clamped to this magnitude (px/frame).
    pub max_velocity: f64,
    /// Whether autoplay runs at all.
    pub autoplay: bool,
    /// Autoplay drift (px/frame).
    pub autoplay_speed: f64,
    /// Wheel delta multiplier for the immediate jump.
    pub wheel_multiplier: f64,
    /// Share of the (multiplied) wheel delta added to momentum velocity.
    pub wheel_velocity_gain: f64,
    /// Released touch velocity is scaled by this before coasting.
    pub fling_damping: f64,
    /// Frame length used to express touch velocity in px/frame.
    pub touch_frame_ms: f64,
    /// Largest blur radius (px).
    pub max_blur: f64,
    /// Fraction of `max_blur` reached at `max_velocity`.
    pub blur_gain: f64,
    /// Per-frame approach factor of the blur toward its target.
    pub blur_smoothing: f64,
    /// Blur at or below this snaps to zero.
    pub blur_floor: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            friction: 0.95,
            min_velocity: 0.1,
            max_velocity: 50.0,
            autoplay: true,
            autoplay_speed: 3.0,
            wheel_multiplier: 2.0,
            wheel_velocity_gain: 0.3,
            fling_damping: 0.5,
            touch_frame_ms: 16.0,
            max_blur: 4.0,
            blur_gain: 0.6,
            blur_smoothing: 0.2,
            blur_floor: 0.1,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(MarqueeError::invalid_config(
                "motion.friction",
                format!("{} is outside (0, 1)", self.friction),
            ));
        }
        if !(self.min_velocity > 0.0 && self.min_velocity < self.max_velocity) {
            return Err(MarqueeError::invalid_config(
                "motion.min_velocity",
                "need 0 < min_velocity < max_velocity",
            ));
        }
        if !self.autoplay_speed.is_finite() || self.autoplay_speed < 0.0 {
            return Err(MarqueeError::invalid_config(
                "motion.autoplay_speed",
                "must be finite and non-negative",
            ));
        }
        if !(self.blur_smoothing > 0.0 && self.blur_smoothing <= 1.0) {
            return Err(MarqueeError::invalid_config(
                "motion.blur_smoothing",
                "must be in (0, 1]",
            ));
        }
        if !(self.touch_frame_ms.is_finite() && self.touch_frame_ms > 0.0) {
            return Err(MarqueeError::invalid_config(
                "motion.touch_frame_ms",
                "must be finite and positive",
            ));
        }
        if !self.max_velocity.is_finite() {
            return Err(MarqueeError::invalid_config("motion.max_velocity", "must be finite"));
        }
        if !self.wheel_multiplier.is_finite() {
            return Err(MarqueeError::invalid_config(
                "motion.wheel_multiplier",
                "must be finite",
            ));
        }
        for (field, value) in [
            ("motion.max_blur", self.max_blur),
            ("motion.blur_gain", self.blur_gain),
            ("motion.blur_floor", self.blur_floor),
            ("motion.wheel_velocity_gain", self.wheel_velocity_gain),
            ("motion.fling_damping", self.fling_damping),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MarqueeError::invalid_config(
                    field,
                    format!("{value} must be finite and non-negative"),
                ));
            }
        }
        Ok(())
    }

    /// Clamp a velocity to `±max_velocity`.
    #[must_use]
    pub fn clamp_velocity(&self, v: f64) -> f64 {
        v.clamp(-self.max_velocity, self.max_velocity)
    }
}

// ---------------------------------------------------------------------------
// Motion blur
// ---------------------------------------------------------------------------

/// Smoothed blur radius proportional to speed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionBlur {
    current: f64,
}

impl MotionBlur {
    /// Blur the current velocity is pulling toward.
    #[must_use]
    pub fn target(velocity: f64, config: &MotionConfig) -> f64 {
        let scaled = velocity.abs() / config.max_velocity * config.max_blur * config.blur_gain;
        scaled.min(config.max_blur)
    }

    /// Approach the target by one step. Returns the new radius.
    pub fn update(&mut self, velocity: f64, config: &MotionConfig) -> f64 {
        let target = Self::target(velocity, config);
        self.current += (target - self.current) * config.blur_smoothing;
        if self.current <= config.blur_floor {
            self.current = 0.0;
        }
        self.current
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.current
    }

    /// CSS `filter` value for the current radius.
    #[must_use]
    pub fn css_filter(&self) -> String {
        Self::css_filter_for(self.current)
    }

    /// CSS `filter` value for `radius`, `none` once the blur has settled.
    #[must_use]
    pub fn css_filter_for(radius: f64) -> String {
        if radius > 0.0 {
            format!("blur({radius:.2}px)")
        } else {
            "none".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Touch tracking
// ---------------------------------------------------------------------------

/// Result of one touch-move sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchStep {
    /// Scroll delta to apply (positive = content moves left).
    pub scroll_delta: f64,
    /// Fresh velocity estimate (px/frame), when time advanced.
    pub velocity: Option<f64>,
}

/// Touch gesture bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchTracker {
    active: bool,
    prev_x: f64,
    prev_y: f64,
    last_x: f64,
    last_time_ms: f64,
    velocity: f64,
}

impl TouchTracker {
    pub fn start(&mut self, x: f64, y: f64, now_ms: f64) {
        *self = Self {
            active: true,
            prev_x: x,
            prev_y: y,
            last_x: x,
            last_time_ms: now_ms,
            velocity: 0.0,
        };
    }

    /// Feed a move sample. Returns `None` for vertical-dominant or stray moves,
    /// which the host should leave to its default handling.
    pub fn move_to(&mut self, x: f64, y: f64, now_ms: f64, frame_ms: f64) -> Option<TouchStep> {
        if !self.active {
            return None;
        }
        let dx = self.prev_x - x;
        let dy = self.prev_y - y;
        self.prev_x = x;
        self.prev_y = y;
        if dx.abs() <= dy.abs() {
            return None;
        }

        let dt = now_ms - self.last_time_ms;
        let velocity = if dt > 0.0 {
            self.velocity = (self.last_x - x) / dt * frame_ms;
            Some(self.velocity)
        } else {
            None
        };
        self.last_x = x;
        self.last_time_ms = now_ms;

        Some(TouchStep {
            scroll_delta: dx,
            velocity,
        })
    }

    /// End the gesture, returning the release velocity (px/frame).
    pub fn end(&mut self) -> f64 {
        self.active = false;
        std::mem::take(&mut self.velocity)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

// ---------------------------------------------------------------------------
// State and snapshot
// ---------------------------------------------------------------------------

/// Mutable motion state. Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub offset: f64,
    /// Signed velocity (px/frame).
    pub velocity: f64,
    /// Global autoplay switch.
    pub autoplay_enabled: bool,
    /// A gesture is in progress.
    pub interacting: bool,
    pub blur: MotionBlur,
}

impl MotionState {
    fn new(autoplay_enabled: bool) -> Self {
        Self {
            offset: 0.0,
            velocity: 0.0,
            autoplay_enabled,
            interacting: false,
            blur: MotionBlur::default(),
        }
    }
}

/// What the host applies after a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSnapshot {
    pub frame: u64,
    pub offset: f64,
    pub velocity: f64,
    pub blur: f64,
    pub unit_width: Option<f64>,
    pub momentum_running: bool,
    pub autoplay_running: bool,
    pub interacting: bool,
    /// A wraparound correction happened this frame.
    pub wrapped: bool,
    /// Input events applied since the previous frame.
    pub coalesced_inputs: u32,
}

impl MotionSnapshot {
    /// Whether the host should keep requesting frames.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.momentum_running || self.autoplay_running || self.blur > 0.0
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Single owner of the scroll offset.
#[derive(Debug, Clone)]
pub struct MotionController {
    config: MotionConfig,
    state: MotionState,
    readiness: UnitReadiness,
    scheduler: FrameScheduler,
    touch: TouchTracker,
    frame: u64,
    inputs_since_frame: u32,
    wraps: u64,
}

impl MotionController {
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        let state = MotionState::new(config.autoplay);
        Self {
            config,
            state,
            readiness: UnitReadiness::Pending,
            scheduler: FrameScheduler::new(),
            touch: TouchTracker::default(),
            frame: 0,
            inputs_since_frame: 0,
            wraps: 0,
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(MotionConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &MotionState {
        &self.state
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.state.offset
    }

    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    #[must_use]
    pub fn blur(&self) -> f64 {
        self.state.blur.radius()
    }

    #[must_use]
    pub fn readiness(&self) -> UnitReadiness {
        self.readiness
    }

    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.state.interacting
    }

    #[must_use]
    pub fn is_momentum_running(&self) -> bool {
        self.scheduler.is_scheduled(Influence::Momentum)
    }

    #[must_use]
    pub fn is_autoplay_running(&self) -> bool {
        self.scheduler.is_scheduled(Influence::Autoplay)
    }

    #[must_use]
    pub fn scheduler_counters(&self) -> SchedulerCounters {
        self.scheduler.counters()
    }

    /// Total wraparound corrections so far.
    #[must_use]
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    // -- readiness --

    /// Readiness signal from the tripler: the unit width is known.
    ///
    /// Jumps to the start of the middle unit and starts autoplay if it was
    /// requested while the width was unknown.
    pub fn on_unit_ready(&mut self, width: f64) {
        self.readiness = UnitReadiness::from_width(width);
        let Some(width) = self.readiness.width() else {
            debug!(width, "unit width unusable, motion stays idle");
            return;
        };
        self.state.offset = width;
        debug!(unit_width = width, "motion ready, initial scroll set");
        self.start_autoplay();
    }

    /// Turn autoplay on or off globally.
    pub fn set_autoplay_enabled(&mut self, enabled: bool) {
        self.state.autoplay_enabled = enabled;
        if enabled {
            self.start_autoplay();
        } else if self.scheduler.cancel(Influence::Autoplay) {
            debug!("autoplay disabled");
        }
    }

    // -- input --

    /// Wheel input: jump by `delta_y × multiplier` and seed momentum.
    ///
    /// The interaction flag only pulses for the duration of the handler, so
    /// autoplay is re-armed rather than left paused.
    pub fn wheel(&mut self, delta_y: f64) {
        if !self.accepts_input() {
            return;
        }
        let delta = delta_y * self.config.wheel_multiplier;
        self.state.velocity = self
            .config
            .clamp_velocity(self.state.velocity + delta * self.config.wheel_velocity_gain);
        self.shift(delta);
        self.state.blur.update(self.state.velocity, &self.config);
        self.start_momentum();
        self.pulse_interaction();
        trace!(delta, velocity = self.state.velocity, "wheel");
    }

    /// Finger down: stop everything and hand control to the gesture.
    pub fn touch_start(&mut self, x: f64, y: f64, now_ms: f64) {
        if !self.accepts_input() {
            return;
        }
        self.touch.start(x, y, now_ms);
        if self.scheduler.cancel(Influence::Momentum) {
            debug!("momentum cancelled by touch");
        }
        self.state.velocity = 0.0;
        self.state.blur.update(0.0, &self.config);
        self.pause_autoplay();
    }

    /// Finger moved. Returns `true` when the move was consumed as a
    /// horizontal scroll (the host should prevent its default action).
    pub fn touch_move(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(step) = self.touch.move_to(x, y, now_ms, self.config.touch_frame_ms) else {
            return false;
        };
        self.shift(step.scroll_delta);
        if let Some(v) = step.velocity {
            self.state.velocity = self.config.clamp_velocity(v);
            self.state.blur.update(self.state.velocity, &self.config);
        }
        true
    }

    /// Finger up: fling if the release was fast enough, then resume autoplay.
    pub fn touch_end(&mut self) {
        if !self.accepts_input() || !self.touch.is_active() {
            return;
        }
        let released = self.touch.end();
        if released.abs() > self.config.min_velocity {
            self.state.velocity = self
                .config
                .clamp_velocity(released * self.config.fling_damping);
            self.state.blur.update(self.state.velocity, &self.config);
            self.start_momentum();
            debug!(velocity = self.state.velocity, "fling");
        } else {
            self.state.velocity = 0.0;
            self.state.blur.update(0.0, &self.config);
        }
        self.resume_autoplay();
    }

    /// The host scrolled the container by other means (scrollbar, keys).
    pub fn sync_scroll(&mut self, scroll_left: f64) {
        if !self.readiness.is_ready() || !scroll_left.is_finite() {
            return;
        }
        self.inputs_since_frame += 1;
        self.state.offset = scroll_left;
        self.scheduler.schedule_once(Influence::WrapCheck);
    }

    // -- frame --

    /// Service one display frame.
    pub fn frame(&mut self) -> MotionSnapshot {
        self.frame += 1;
        let mut wrapped = false;

        for influence in Influence::FRAME_ORDER {
            if self.scheduler.take(influence).is_none() {
                continue;
            }
            match influence {
                Influence::Momentum => self.step_momentum(),
                Influence::Autoplay => self.step_autoplay(),
                Influence::WrapCheck => wrapped = self.correct_wrap(),
            }
        }
        self.state.blur.update(self.state.velocity, &self.config);

        let snapshot = self.snapshot(wrapped);
        self.inputs_since_frame = 0;
        trace!(
            frame = snapshot.frame,
            offset = snapshot.offset,
            velocity = snapshot.velocity,
            blur = snapshot.blur,
            "motion frame"
        );
        snapshot
    }

    /// Current state without advancing.
    #[must_use]
    pub fn snapshot(&self, wrapped: bool) -> MotionSnapshot {
        MotionSnapshot {
            frame: self.frame,
            offset: self.state.offset,
            velocity: self.state.velocity,
            blur: self.state.blur.radius(),
            unit_width: self.readiness.width(),
            momentum_running: self.is_momentum_running(),
            autoplay_running: self.is_autoplay_running(),
            interacting: self.state.interacting,
            wrapped,
            coalesced_inputs: self.inputs_since_frame,
        }
    }

    fn step_momentum(&mut self) {
        if self.state.velocity.abs() < self.config.min_velocity {
            self.state.velocity = 0.0;
            debug!("momentum settled");
            return;
        }
        self.shift(self.state.velocity);
        self.state.velocity *= self.config.friction;
        self.scheduler.schedule(Influence::Momentum);
    }

    fn step_autoplay(&mut self) {
        if !self.state.autoplay_enabled || self.state.interacting || !self.readiness.is_ready() {
            return;
        }
        self.shift(self.config.autoplay_speed);
        self.scheduler.schedule(Influence::Autoplay);
    }

    /// Snap the offset back into `[0, 2W)`. Returns whether it moved.
    fn correct_wrap(&mut self) -> bool {
        let Some(width) = self.readiness.width() else {
            return false;
        };
        let offset = self.state.offset;
        let corrected = if offset >= width * 2.0 {
            width + (offset - width).rem_euclid(width)
        } else if offset < 0.0 {
            offset.rem_euclid(width)
        } else {
            return false;
        };
        self.state.offset = corrected;
        self.wraps += 1;
        debug!(from = offset, to = corrected, "wraparound");
        true
    }

    // -- influence bookkeeping --

    fn accepts_input(&mut self) -> bool {
        if self.readiness.is_ready() {
            self.inputs_since_frame += 1;
            true
        } else {
            trace!("input before unit ready ignored");
            false
        }
    }

    fn shift(&mut self, delta: f64) {
        self.state.offset += delta;
        self.scheduler.schedule_once(Influence::WrapCheck);
    }

    fn start_momentum(&mut self) {
        if !self.is_momentum_running() && self.state.velocity.abs() >= self.config.min_velocity {
            self.scheduler.schedule(Influence::Momentum);
            debug!(velocity = self.state.velocity, "momentum started");
        }
    }

    fn pause_autoplay(&mut self) {
        self.state.interacting = true;
        if self.scheduler.cancel(Influence::Autoplay) {
            debug!("autoplay paused");
        }
    }

    fn resume_autoplay(&mut self) {
        self.state.interacting = false;
        self.start_autoplay();
    }

    /// Wheel ticks mark an interaction without leaving autoplay paused. An
    /// ongoing touch keeps its pause.
    fn pulse_interaction(&mut self) {
        if self.touch.is_active() {
            return;
        }
        self.scheduler.cancel(Influence::Autoplay);
        self.resume_autoplay();
    }

    fn start_autoplay(&mut self) {
        if self.is_autoplay_running() || self.state.interacting || !self.state.autoplay_enabled {
            return;
        }
        if !self.readiness.is_ready() {
            debug!("autoplay deferred until unit width is known");
            return;
        }
        self.scheduler.schedule(Influence::Autoplay);
        debug!(speed = self.config.autoplay_speed, "autoplay running");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const W: f64 = 2000.0;

    fn ready() -> MotionController {
        let mut m = MotionController::with_defaults();
        m.on_unit_ready(W);
        m
    }

    fn ready_without_autoplay() -> MotionController {
        let mut m = MotionController::new(MotionConfig {
            autoplay: false,
            ..MotionConfig::default()
        });
        m.on_unit_ready(W);
        m
    }

    // -- config --

    #[test]
    fn default_config_is_valid() {
        let cfg = MotionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.friction, 0.95);
        assert_eq!(cfg.max_velocity, 50.0);
    }

    #[test]
    fn config_rejects_inverted_velocity_bounds() {
        let cfg = MotionConfig {
            min_velocity: 60.0,
            ..MotionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_rejects_non_finite_and_negative_gains() {
        let with = |edit: fn(&mut MotionConfig)| {
            let mut cfg = MotionConfig::default();
            edit(&mut cfg);
            cfg
        };
        let cases = [
            ("motion.max_blur", with(|c| c.max_blur = f64::INFINITY)),
            ("motion.blur_gain", with(|c| c.blur_gain = -0.1)),
            ("motion.wheel_multiplier", with(|c| c.wheel_multiplier = f64::NAN)),
            ("motion.wheel_velocity_gain", with(|c| c.wheel_velocity_gain = -1.0)),
            ("motion.fling_damping", with(|c| c.fling_damping = f64::NAN)),
            ("motion.touch_frame_ms", with(|c| c.touch_frame_ms = f64::INFINITY)),
        ];
        for (expected, cfg) in cases {
            match cfg.validate() {
                Err(MarqueeError::InvalidConfig { field, .. }) => assert_eq!(field, expected),
                other => panic!("{expected}: expected InvalidConfig, got {other:?}"),
            }
        }
    }

    #[test]
    fn config_allows_reversed_wheel() {
        let cfg = MotionConfig {
            wheel_multiplier: -2.0,
            ..MotionConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    // -- readiness --

    #[test]
    fn idle_until_ready() {
        let mut m = MotionController::with_defaults();
        m.wheel(100.0);
        let snap = m.frame();
        assert_eq!(snap.offset, 0.0);
        assert!(!snap.autoplay_running);
        assert_eq!(snap.unit_width, None);
    }

    #[test]
    fn ready_sets_initial_scroll_and_starts_autoplay() {
        let m = ready();
        assert_eq!(m.offset(), W);
        assert!(m.is_autoplay_running());
    }

    #[test]
    fn zero_width_stays_pending() {
        let mut m = MotionController::with_defaults();
        m.on_unit_ready(0.0);
        assert!(!m.readiness().is_ready());
        assert!(!m.is_autoplay_running());
    }

    // -- autoplay --

    #[test]
    fn autoplay_drifts_three_px_per_frame() {
        let mut m = ready();
        m.frame();
        m.frame();
        assert_eq!(m.offset(), W + 6.0);
    }

    #[test]
    fn autoplay_toggle() {
        let mut m = ready();
        m.set_autoplay_enabled(false);
        m.frame();
        assert_eq!(m.offset(), W);
        m.set_autoplay_enabled(true);
        m.frame();
        assert_eq!(m.offset(), W + 3.0);
    }

    // -- wheel --

    #[test]
    fn wheel_jumps_and_seeds_velocity() {
        let mut m = ready_without_autoplay();
        m.wheel(100.0);
        assert_eq!(m.offset(), W + 200.0);
        // 200 * 0.3 = 60, clamped
        assert_eq!(m.velocity(), 50.0);
        assert!(m.is_momentum_running());
    }

    #[test]
    fn small_wheel_is_not_clamped() {
        let mut m = ready_without_autoplay();
        m.wheel(10.0);
        assert_eq!(m.offset(), W + 20.0);
        assert!((m.velocity() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn wheel_keeps_autoplay_armed() {
        let mut m = ready();
        m.wheel(10.0);
        assert!(!m.is_interacting());
        assert!(m.is_autoplay_running());
    }

    #[test]
    fn wheel_velocity_accumulates_then_clamps() {
        let mut m = ready_without_autoplay();
        m.wheel(-30.0);
        m.wheel(-30.0);
        m.wheel(-30.0);
        assert_eq!(m.velocity(), -50.0);
    }

    // -- momentum --

    #[test]
    fn momentum_decays_geometrically_and_stops() {
        let mut m = ready_without_autoplay();
        m.wheel(10.0); // v = 6
        let mut prev = m.velocity();
        let mut frames = 0;
        while m.is_momentum_running() {
            let before = m.velocity();
            m.frame();
            if m.velocity() != 0.0 {
                assert!((m.velocity() - before * 0.95).abs() < 1e-12);
                assert!(m.velocity().abs() < prev.abs());
            }
            prev = m.velocity();
            frames += 1;
            assert!(frames < 1000, "momentum did not stop");
        }
        assert_eq!(m.velocity(), 0.0);
        // 6 * 0.95^n < 0.1  =>  n = 80
        assert_eq!(frames, 81);
    }

    #[test]
    fn momentum_and_autoplay_compose() {
        let mut m = ready();
        m.wheel(10.0);
        let after_wheel = m.offset();
        m.frame();
        assert!((m.offset() - (after_wheel + 6.0 + 3.0)).abs() < 1e-9);
    }

    // -- touch --

    #[test]
    fn touch_pauses_autoplay_until_release() {
        let mut m = ready();
        m.touch_start(500.0, 300.0, 0.0);
        assert!(m.is_interacting());
        assert!(!m.is_autoplay_running());
        m.frame();
        assert_eq!(m.offset(), W);
        m.touch_end();
        assert!(!m.is_interacting());
        assert!(m.is_autoplay_running());
    }

    #[test]
    fn touch_start_cancels_momentum() {
        let mut m = ready();
        m.wheel(50.0);
        assert!(m.is_momentum_running());
        m.touch_start(0.0, 0.0, 0.0);
        assert!(!m.is_momentum_running());
        assert_eq!(m.velocity(), 0.0);
    }

    #[test]
    fn horizontal_drag_scrolls_and_flings() {
        let mut m = ready_without_autoplay();
        m.touch_start(500.0, 300.0, 1000.0);
        assert!(m.touch_move(480.0, 302.0, 1016.0));
        assert_eq!(m.offset(), W + 20.0);
        // (500 - 480) / 16 * 16 = 20 px/frame
        assert_eq!(m.velocity(), 20.0);
        m.touch_end();
        assert_eq!(m.velocity(), 10.0);
        assert!(m.is_momentum_running());
    }

    #[test]
    fn vertical_drag_is_left_to_host() {
        let mut m = ready_without_autoplay();
        m.touch_start(500.0, 300.0, 0.0);
        assert!(!m.touch_move(498.0, 250.0, 16.0));
        assert_eq!(m.offset(), W);
    }

    #[test]
    fn slow_release_zeroes_velocity() {
        let mut m = ready_without_autoplay();
        m.touch_start(500.0, 300.0, 0.0);
        m.touch_move(499.95, 300.0, 1000.0);
        m.touch_end();
        assert_eq!(m.velocity(), 0.0);
        assert!(!m.is_momentum_running());
    }

    #[test]
    fn fling_is_clamped() {
        let mut m = ready_without_autoplay();
        m.touch_start(900.0, 0.0, 0.0);
        m.touch_move(100.0, 0.0, 16.0);
        assert_eq!(m.velocity(), 50.0);
        m.touch_end();
        assert_eq!(m.velocity(), 50.0);
    }

    // -- wraparound --

    #[test]
    fn wraps_past_end_of_middle_unit() {
        let mut m = ready_without_autoplay();
        m.sync_scroll(2.0 * W + 15.0);
        let snap = m.frame();
        assert!(snap.wrapped);
        assert_eq!(snap.offset, W + 15.0);
    }

    #[test]
    fn wraps_negative_offsets() {
        let mut m = ready_without_autoplay();
        m.sync_scroll(-40.0);
        assert_eq!(m.frame().offset, W - 40.0);
    }

    #[test]
    fn wrap_check_runs_after_momentum_in_same_frame() {
        let mut m = ready_without_autoplay();
        m.sync_scroll(2.0 * W - 1.0);
        m.frame();
        m.wheel(1.0); // +2 px jump, v = 0.6
        let snap = m.frame();
        assert!(snap.wrapped);
        assert!(snap.offset >= 0.0 && snap.offset < 2.0 * W);
    }

    #[test]
    fn burst_of_scroll_events_coalesces_to_one_check() {
        let mut m = ready_without_autoplay();
        for i in 0..20 {
            m.sync_scroll(2.0 * W + f64::from(i));
        }
        assert_eq!(m.scheduler_counters().coalesced, 19);
        let snap = m.frame();
        assert_eq!(snap.coalesced_inputs, 20);
        assert_eq!(m.wraps(), 1);
        assert_eq!(snap.offset, W + 19.0);
    }

    #[test]
    fn huge_jump_still_lands_in_range() {
        let mut m = ready_without_autoplay();
        m.sync_scroll(11.5 * W);
        let offset = m.frame().offset;
        assert!((0.0..2.0 * W).contains(&offset));
        assert!((offset - 1.5 * W).abs() < 1e-9);
    }

    // -- blur --

    #[test]
    fn blur_tracks_speed_and_settles_to_zero() {
        let mut m = ready_without_autoplay();
        m.wheel(100.0);
        assert!(m.blur() > 0.0);
        for _ in 0..400 {
            m.frame();
        }
        assert_eq!(m.blur(), 0.0);
        assert!(!m.frame().is_animating());
    }

    #[test]
    fn blur_target_is_capped() {
        let cfg = MotionConfig::default();
        assert!((MotionBlur::target(50.0, &cfg) - 2.4).abs() < 1e-12);
        assert!((MotionBlur::target(-500.0, &cfg) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn blur_first_step_is_a_fifth_of_target() {
        let cfg = MotionConfig::default();
        let mut blur = MotionBlur::default();
        let r = blur.update(50.0, &cfg);
        assert!((r - 0.48).abs() < 1e-12);
        assert_eq!(blur.css_filter(), "blur(0.48px)");
    }

    #[test]
    fn settled_blur_clears_the_filter() {
        assert_eq!(MotionBlur::default().css_filter(), "none");
        assert_eq!(MotionBlur::css_filter_for(1.5), "blur(1.50px)");
    }
}
