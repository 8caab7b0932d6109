//! One-shot effects that live outside the character swarm.
//!
//! [`FxPool`] holds short-lived burst particles (brick explosions, sparks)
//! and [`BallTrails`] holds fading dots behind moving balls. Both follow the
//! same decay-and-reap loop: every tick, life drops, and anything at or
//! below zero is removed before it is drawn.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::canvas::{BlendMode, Canvas};
use crate::palette::Color;

/// Particles per burst when the caller has no preference.
pub const DEFAULT_BURST_COUNT: usize = 30;

/// Burst spread when the caller has no preference.
pub const DEFAULT_BURST_RADIUS: f32 = 25.0;

const FX_GRAVITY: f32 = 0.1;
const FX_SIZE: f32 = 3.0;
const MIN_DECAY: f32 = 0.01;
const DECAY_RANGE: f32 = 0.05;

/// A single burst particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FxParticle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub color: Color,
    pub life: f32,
    /// Life lost per tick, in `[0.01, 0.06)`.
    pub decay: f32,
}

/// Pool of burst particles with gravity and per-particle decay.
pub struct FxPool {
    particles: Vec<FxParticle>,
    rng: StdRng,
}

impl Default for FxPool {
    fn default() -> Self {
        Self::new()
    }
}

impl FxPool {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Pool with a reproducible RNG.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Emit `count` particles from `(x, y)`.
    ///
    /// Initial velocities are uniform in a square of side `radius * 0.4`
    /// per axis, so the burst covers roughly `radius` pixels before gravity
    /// and decay take over.
    pub fn spawn(&mut self, x: f32, y: f32, color: Color, count: usize, radius: f32) {
        let spread = radius.max(0.0) * 0.4;
        self.particles.reserve(count);
        for _ in 0..count {
            self.particles.push(FxParticle {
                x,
                y,
                vx: (self.rng.gen::<f32>() - 0.5) * spread,
                vy: (self.rng.gen::<f32>() - 0.5) * spread,
                color,
                life: 1.0,
                decay: MIN_DECAY + self.rng.gen::<f32>() * DECAY_RANGE,
            });
        }
    }

    /// [`spawn`](Self::spawn) with the default count and radius.
    pub fn burst(&mut self, x: f32, y: f32, color: Color) {
        self.spawn(x, y, color, DEFAULT_BURST_COUNT, DEFAULT_BURST_RADIUS);
    }

    /// Advance one tick and remove dead particles.
    pub fn update(&mut self) {
        self.particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= p.decay;
            p.vy += FX_GRAVITY;
            p.life > 0.0
        });
    }

    /// Draw live particles as small squares faded by life.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        for p in &self.particles {
            canvas.fill_rect(p.x, p.y, FX_SIZE, FX_SIZE, p.color.with_alpha(p.life), BlendMode::Alpha);
        }
    }

    pub fn update_and_draw(&mut self, canvas: &mut dyn Canvas) {
        self.update();
        self.draw(canvas);
    }

    pub fn particles(&self) -> &[FxParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

/// Maximum number of dots kept by [`BallTrails`].
pub const TRAIL_CAPACITY: usize = 512;

const TRAIL_DECAY: f32 = 0.08;
const TRAIL_RADIUS: f32 = 4.0;
const TRAIL_ALPHA: f32 = 0.4;

/// One fading dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailDot {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Color,
    pub life: f32,
}

/// Bounded ring of fading dots. When full, the oldest dot is dropped.
#[derive(Clone, Debug)]
pub struct BallTrails {
    dots: VecDeque<TrailDot>,
    capacity: usize,
}

impl Default for BallTrails {
    fn default() -> Self {
        Self::new()
    }
}

impl BallTrails {
    pub fn new() -> Self {
        Self::with_capacity(TRAIL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            dots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop a dot of the default radius at `(x, y)`.
    pub fn add(&mut self, x: f32, y: f32, color: Color) {
        self.add_sized(x, y, color, TRAIL_RADIUS);
    }

    pub fn add_sized(&mut self, x: f32, y: f32, color: Color, radius: f32) {
        if self.dots.len() == self.capacity {
            self.dots.pop_front();
        }
        self.dots.push_back(TrailDot {
            x,
            y,
            radius,
            color,
            life: 1.0,
        });
    }

    /// Age every dot one tick and remove the expired ones.
    pub fn update(&mut self) {
        self.dots.retain_mut(|d| {
            d.life -= TRAIL_DECAY;
            d.life > 0.0
        });
    }

    /// Draw dots shrinking and fading with life.
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        for d in &self.dots {
            canvas.fill_circle(
                d.x,
                d.y,
                d.radius * d.life,
                d.color.with_alpha(d.life * TRAIL_ALPHA),
                BlendMode::Alpha,
            );
        }
    }

    pub fn update_and_draw(&mut self, canvas: &mut dyn Canvas) {
        self.update();
        self.draw(canvas);
    }

    pub fn dots(&self) -> impl Iterator<Item = &TrailDot> {
        self.dots.iter()
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    pub fn clear(&mut self) {
        self.dots.clear();
    }
}
