#![forbid(unsafe_code)]

//! Drifting blend circles behind the marquee.
//!
//! A handful of very large circles wander across the viewport, bounce off a
//! band that extends half a circle beyond each edge, and occasionally pick a
//! new heading. Scrolling the marquee nudges them the other way (parallax).
//! The field only produces positions; the host owns the elements.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MarqueeError, Result};

/// Viewport extents in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height, or 1 for a degenerate viewport.
    #[must_use]
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 && self.width.is_finite() {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientConfig {
    pub circles: usize,
    /// Smallest circle diameter (px).
    pub min_size: f64,
    /// Diameter is `min_size + r × size_spread` for uniform `r`.
    pub size_spread: f64,
    /// Per-axis speed is uniform in `±max_speed / 2`.
    pub max_speed: f64,
    /// Per-circle, per-frame chance of a new random heading.
    pub rethink_chance: f64,
    /// Fraction of a scroll delta applied against the circles.
    pub parallax: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            circles: 3,
            min_size: 3500.0,
            size_spread: 1400.0,
            max_speed: 0.8,
            rethink_chance: 0.01,
            parallax: 0.1,
        }
    }
}

impl AmbientConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rethink_chance) {
            return Err(MarqueeError::invalid_config(
                "ambient.rethink_chance",
                "must be a probability",
            ));
        }
        if self.min_size <= 0.0 || self.size_spread < 0.0 {
            return Err(MarqueeError::invalid_config(
                "ambient.min_size",
                "circle sizes must be positive",
            ));
        }
        Ok(())
    }
}

/// One circle: top-left position, velocity and diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendCircle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
}

impl BlendCircle {
    fn step(&mut self, viewport: Viewport) {
        let half = self.size / 2.0;
        self.x += self.vx;
        self.y += self.vy;

        if self.x < -half || self.x > viewport.width + half {
            self.vx = -self.vx;
        }
        if self.y < -half || self.y > viewport.height + half {
            self.vy = -self.vy;
        }
        self.x = self.x.clamp(-half, viewport.width + half);
        self.y = self.y.clamp(-half, viewport.height + half);
    }
}

#[derive(Debug, Clone)]
pub struct AutoBlendField {
    config: AmbientConfig,
    viewport: Viewport,
    circles: Vec<BlendCircle>,
    last_scroll: f64,
}

impl AutoBlendField {
    pub fn new<R: Rng + ?Sized>(config: AmbientConfig, viewport: Viewport, rng: &mut R) -> Self {
        let circles = (0..config.circles)
            .map(|_| BlendCircle {
                size: config.min_size + rng.random::<f64>() * config.size_spread,
                x: rng.random::<f64>() * viewport.width,
                y: rng.random::<f64>() * viewport.height,
                vx: random_speed(rng, config.max_speed),
                vy: random_speed(rng, config.max_speed),
            })
            .collect();
        Self {
            config,
            viewport,
            circles,
            last_scroll: 0.0,
        }
    }

    #[must_use]
    pub fn circles(&self) -> &[BlendCircle] {
        &self.circles
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Advance one frame.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let viewport = self.viewport;
        for circle in &mut self.circles {
            circle.step(viewport);
            if rng.random_bool(self.config.rethink_chance) {
                circle.vx = random_speed(rng, self.config.max_speed);
                circle.vy = random_speed(rng, self.config.max_speed);
                trace!(vx = circle.vx, vy = circle.vy, "circle changed heading");
            }
        }
    }

    /// Apply parallax for the container now being at `scroll_left`.
    pub fn on_scroll(&mut self, scroll_left: f64) {
        let delta = scroll_left - self.last_scroll;
        self.last_scroll = scroll_left;
        for circle in &mut self.circles {
            circle.x -= delta * self.config.parallax;
        }
    }

    /// Flattened `[x, y, size]` triples for cheap transfer to the host.
    #[must_use]
    pub fn positions(&self) -> Vec<f64> {
        self.circles
            .iter()
            .flat_map(|c| [c.x, c.y, c.size])
            .collect()
    }
}

fn random_speed<R: Rng + ?Sized>(rng: &mut R, max_speed: f64) -> f64 {
    (rng.random::<f64>() - 0.5) * max_speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn field(seed: u64) -> (AutoBlendField, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let viewport = Viewport::new(1000.0, 800.0);
        let f = AutoBlendField::new(AmbientConfig::default(), viewport, &mut rng);
        (f, rng)
    }

    #[test]
    fn circles_start_inside_viewport_with_expected_sizes() {
        let (f, _) = field(7);
        assert_eq!(f.circles().len(), 3);
        for c in f.circles() {
            assert!((3500.0..4900.0).contains(&c.size));
            assert!((0.0..1000.0).contains(&c.x));
            assert!((0.0..800.0).contains(&c.y));
            assert!(c.vx.abs() <= 0.4 && c.vy.abs() <= 0.4);
        }
    }

    #[test]
    fn circles_stay_in_band() {
        let (mut f, mut rng) = field(11);
        for _ in 0..20_000 {
            f.step(&mut rng);
        }
        for c in f.circles() {
            let half = c.size / 2.0;
            assert!(c.x >= -half && c.x <= 1000.0 + half);
            assert!(c.y >= -half && c.y <= 800.0 + half);
        }
    }

    #[test]
    fn bounce_reverses_velocity() {
        let mut c = BlendCircle {
            x: 1000.0 + 50.0,
            y: 0.0,
            vx: 0.4,
            vy: 0.0,
            size: 99.0,
        };
        c.step(Viewport::new(1000.0, 800.0));
        assert_eq!(c.vx, -0.4);
        assert_eq!(c.x, 1049.5);
    }

    #[test]
    fn scroll_parallax_moves_against_scroll() {
        let (mut f, _) = field(3);
        let before: Vec<f64> = f.circles().iter().map(|c| c.x).collect();
        f.on_scroll(200.0);
        for (c, x) in f.circles().iter().zip(before) {
            assert!((c.x - (x - 20.0)).abs() < 1e-9);
        }
        let after = f.circles()[0].x;
        f.on_scroll(150.0);
        assert!((f.circles()[0].x - (after + 5.0)).abs() < 1e-9);
    }

    #[test]
    fn positions_are_flat_triples() {
        let (f, _) = field(5);
        let p = f.positions();
        assert_eq!(p.len(), 9);
        assert_eq!(p[2], f.circles()[0].size);
    }

    #[test]
    fn aspect_of_degenerate_viewport() {
        assert_eq!(Viewport::new(100.0, 0.0).aspect(), 1.0);
        assert_eq!(Viewport::new(1600.0, 800.0).aspect(), 2.0);
    }
}
