#![forbid(unsafe_code)]

//! Pointer-driven spotlight: a DOM blend disc and a shader spotlight.
//!
//! Two presentations share the pointer. [`CursorFollower`] eases a large
//! blend disc toward the pointer; [`SpotlightUniforms`] feeds a full-screen
//! fragment shader. [`SpotlightSelector`] decides once, shortly after the
//! marquee starts, which of the two the host shows.
//!
//! [`spotlight_brightness`] evaluates the fragment shader on the CPU. Hosts
//! without a GPU path can use it for a fallback texture; tests use it as the
//! reference for the uniforms.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ambient::Viewport;
use crate::error::{MarqueeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CursorConfig {
    /// Per-frame approach factor of the blend disc.
    pub follow_easing: f64,
    /// Disc diameter while the pointer is over the marquee (px).
    pub hover_size: f64,
    /// Disc diameter elsewhere (px).
    pub idle_size: f64,
    /// Per-frame approach factor of the shader spotlight.
    pub spotlight_easing: f64,
    pub spotlight_radius: f64,
    pub spotlight_intensity: f64,
    /// Shader time advance per frame.
    pub time_step: f64,
    /// Delay between marquee start and the presentation choice.
    pub mode_delay_ms: u64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            follow_easing: 0.25,
            hover_size: 4704.0,
            idle_size: 3360.0,
            spotlight_easing: 0.12,
            spotlight_radius: 0.6,
            spotlight_intensity: 1.0,
            time_step: 0.01,
            mode_delay_ms: 1_000,
        }
    }
}

impl CursorConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, easing) in [
            ("cursor.follow_easing", self.follow_easing),
            ("cursor.spotlight_easing", self.spotlight_easing),
        ] {
            if !(easing > 0.0 && easing <= 1.0) {
                return Err(MarqueeError::invalid_config(field, "easing must be in (0, 1]"));
            }
        }
        if self.spotlight_radius <= 0.0 {
            return Err(MarqueeError::invalid_config(
                "cursor.spotlight_radius",
                "must be positive",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blend disc
// ---------------------------------------------------------------------------

/// Blend disc that trails the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFollower {
    easing: f64,
    hover_size: f64,
    idle_size: f64,
    target: (f64, f64),
    position: (f64, f64),
    active: bool,
    hovering: bool,
}

impl CursorFollower {
    #[must_use]
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            easing: config.follow_easing,
            hover_size: config.hover_size,
            idle_size: config.idle_size,
            target: (0.0, 0.0),
            position: (0.0, 0.0),
            active: false,
            hovering: false,
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.target = (x, y);
        self.active = true;
    }

    /// Pointer left the document: hide and freeze.
    pub fn pointer_leave(&mut self) {
        self.active = false;
    }

    /// Pointer came back. Reactivates only if a position was ever seen.
    pub fn pointer_enter(&mut self) {
        if self.target.0 > 0.0 && self.target.1 > 0.0 {
            self.active = true;
        }
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    /// Ease toward the pointer. Frozen while inactive.
    pub fn step(&mut self) {
        if !self.active {
            return;
        }
        self.position.0 += (self.target.0 - self.position.0) * self.easing;
        self.position.1 += (self.target.1 - self.position.1) * self.easing;
    }

    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Current disc diameter.
    #[must_use]
    pub fn size(&self) -> f64 {
        if self.hovering { self.hover_size } else { self.idle_size }
    }
}

// ---------------------------------------------------------------------------
// Shader spotlight
// ---------------------------------------------------------------------------

/// Uniform block of the spotlight shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpotlightUniforms {
    /// Eased pointer in UV space, y up.
    pub mouse: (f64, f64),
    #[serde(skip)]
    target: (f64, f64),
    #[serde(skip)]
    easing: f64,
    #[serde(skip)]
    time_step: f64,
    pub time: f64,
    pub aspect_ratio: f64,
    pub intensity: f64,
    pub radius: f64,
}

impl SpotlightUniforms {
    #[must_use]
    pub fn new(config: &CursorConfig, viewport: Viewport) -> Self {
        Self {
            mouse: (0.5, 0.5),
            target: (0.5, 0.5),
            easing: config.spotlight_easing,
            time_step: config.time_step,
            time: 0.0,
            aspect_ratio: viewport.aspect(),
            intensity: config.spotlight_intensity,
            radius: config.spotlight_radius,
        }
    }

    /// Retarget from a pointer position in CSS pixels.
    pub fn pointer_move(&mut self, x: f64, y: f64, viewport: Viewport) {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }
        self.target = (x / viewport.width, 1.0 - y / viewport.height);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.aspect_ratio = viewport.aspect();
    }

    pub fn step(&mut self) {
        self.time += self.time_step;
        self.mouse.0 += (self.target.0 - self.mouse.0) * self.easing;
        self.mouse.1 += (self.target.1 - self.mouse.1) * self.easing;
    }

    #[must_use]
    pub fn target(&self) -> (f64, f64) {
        self.target
    }
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Brightness in `[0, 1]` of the spotlight at `uv` (y up).
#[must_use]
pub fn spotlight_brightness(uv: (f64, f64), u: &SpotlightUniforms) -> f64 {
    let st = (uv.0 * u.aspect_ratio, uv.1);
    let mouse = (u.mouse.0 * u.aspect_ratio, u.mouse.1);
    let dist = (st.0 - mouse.0).hypot(st.1 - mouse.1);

    let radius = u.radius;
    let softness = radius * 0.5;

    let mut spot = 1.0 - smoothstep(radius - softness, radius + softness, dist);
    spot = spot.powf(1.2) * u.intensity;
    spot += (1.0 - smoothstep(0.0, radius * 0.3, dist)) * 0.3;

    let core = (1.0 - smoothstep(0.0, radius * 0.2, dist)).powf(0.5) * 2.5;
    let glow = (1.0 - smoothstep(radius * 0.2, radius * 0.5, dist)).powf(1.2) * 1.8;

    (spot + core + glow).min(1.0)
}

// ---------------------------------------------------------------------------
// Presentation choice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotlightMode {
    Shader,
    CursorBlend,
}

/// Picks the presentation once, a fixed delay after the marquee starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotlightSelector {
    delay: Duration,
    started_at: Option<Duration>,
    shader_available: bool,
    mode: Option<SpotlightMode>,
}

impl SpotlightSelector {
    #[must_use]
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.mode_delay_ms),
            started_at: None,
            shader_available: false,
            mode: None,
        }
    }

    /// Start the countdown. Later calls are ignored.
    pub fn start(&mut self, now: Duration) {
        self.started_at.get_or_insert(now);
    }

    /// Host reports whether it can run the shader. Only matters before the
    /// decision.
    pub fn set_shader_available(&mut self, available: bool) {
        self.shader_available = available;
    }

    /// Decide once the delay has elapsed. Returns the decision when it is made
    /// on this call.
    pub fn poll(&mut self, now: Duration) -> Option<SpotlightMode> {
        if self.mode.is_some() {
            return None;
        }
        let started = self.started_at?;
        if now.saturating_sub(started) < self.delay {
            return None;
        }
        let mode = if self.shader_available {
            SpotlightMode::Shader
        } else {
            SpotlightMode::CursorBlend
        };
        info!(?mode, "spotlight presentation chosen");
        self.mode = Some(mode);
        Some(mode)
    }

    #[must_use]
    pub fn mode(&self) -> Option<SpotlightMode> {
        self.mode
    }
}
