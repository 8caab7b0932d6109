//! Tunables for the character swarm.
//!
//! Every constant the simulation uses lives on [`SwarmConfig`] so both
//! backends, the generated WGSL and the tests read from one place.
//!
//! # Example
//!
//! ```ignore
//! let config = SwarmConfig::new()
//!     .with_particle_count(8_000)
//!     .with_spring(0.12, 0.78)
//!     .with_seed(7);
//! ```

use glam::Vec2;

use crate::palette::Palette;

/// Breathing oscillation applied to every spring target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreatheConfig {
    /// Angular speed in radians per millisecond.
    pub speed: f32,
    /// Vertical amplitude in pixels.
    pub amount: f32,
}

impl Default for BreatheConfig {
    fn default() -> Self {
        Self {
            speed: 0.005,
            amount: 8.0,
        }
    }
}

/// Dual-source interference pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveConfig {
    pub source1: Vec2,
    pub source2: Vec2,
    /// Spatial frequency (radians per pixel of distance).
    pub frequency: f32,
    /// Temporal speed (radians per second).
    pub speed: f32,
    /// Amplitude at zero music intensity.
    pub base_amplitude: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            source1: Vec2::new(-40.0, 0.0),
            source2: Vec2::new(40.0, 0.0),
            frequency: 0.1,
            speed: 2.0,
            base_amplitude: 4.0,
        }
    }
}

/// Configuration for a [`Swarm`](crate::Swarm).
#[derive(Clone, Debug)]
pub struct SwarmConfig {
    /// Particle count used by the GPU backend.
    pub particle_count: u32,
    /// Particle count used by the CPU fallback.
    pub cpu_particle_count: u32,
    /// Canvas size in pixels.
    pub canvas: Vec2,
    /// Where particles appear before the first update.
    pub spawn_origin: Vec2,
    pub breathe: BreatheConfig,
    pub wave: WaveConfig,
    pub spring_force: f32,
    pub damping: f32,
    /// Smallest randomized particle size in pixels.
    pub size_min: f32,
    /// Width of the randomized size range in pixels.
    pub size_range: f32,
    /// Pixel scale applied to sampled model vertices.
    pub model_scale: Vec2,
    pub palette: Palette,
    /// Seed for the CPU-side RNG; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Play the timed opening sequence from the first update.
    pub intro: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            particle_count: 12_000,
            cpu_particle_count: 300,
            canvas: Vec2::new(1920.0, 1080.0),
            spawn_origin: Vec2::new(960.0, 1020.0),
            breathe: BreatheConfig::default(),
            wave: WaveConfig::default(),
            spring_force: 0.1,
            damping: 0.8,
            size_min: 1.0,
            size_range: 2.0,
            model_scale: Vec2::new(120.0, 120.0),
            palette: Palette::default(),
            seed: None,
            intro: false,
        }
    }
}

impl SwarmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the GPU particle count.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the CPU fallback particle count.
    pub fn with_cpu_particle_count(mut self, count: u32) -> Self {
        self.cpu_particle_count = count;
        self
    }

    /// Set the canvas size. Also moves the spawn origin to the bottom center.
    pub fn with_canvas(mut self, width: f32, height: f32) -> Self {
        self.canvas = Vec2::new(width, height);
        self.spawn_origin = Vec2::new(width / 2.0, height - 60.0);
        self
    }

    pub fn with_spawn_origin(mut self, origin: Vec2) -> Self {
        self.spawn_origin = origin;
        self
    }

    pub fn with_breathe(mut self, speed: f32, amount: f32) -> Self {
        self.breathe = BreatheConfig { speed, amount };
        self
    }

    pub fn with_wave(mut self, wave: WaveConfig) -> Self {
        self.wave = wave;
        self
    }

    /// Set spring stiffness and per-frame velocity damping.
    pub fn with_spring(mut self, spring_force: f32, damping: f32) -> Self {
        self.spring_force = spring_force;
        self.damping = damping;
        self
    }

    pub fn with_size_range(mut self, min: f32, range: f32) -> Self {
        self.size_min = min;
        self.size_range = range;
        self
    }

    pub fn with_model_scale(mut self, x: f32, y: f32) -> Self {
        self.model_scale = Vec2::new(x, y);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Enable the opening sequence (see [`IntroPhase`](crate::IntroPhase)).
    pub fn with_intro(mut self, enabled: bool) -> Self {
        self.intro = enabled;
        self
    }

    /// Make CPU-side randomness reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_character_constants() {
        let config = SwarmConfig::new();
        assert_eq!(config.particle_count, 12_000);
        assert_eq!(config.cpu_particle_count, 300);
        assert!((config.spring_force - 0.1).abs() < 1e-6);
        assert!((config.damping - 0.8).abs() < 1e-6);
        assert!((config.breathe.speed - 0.005).abs() < 1e-6);
        assert_eq!(config.breathe.amount, 8.0);
        assert_eq!(config.wave.source1, Vec2::new(-40.0, 0.0));
        assert_eq!(config.wave.source2, Vec2::new(40.0, 0.0));
        assert_eq!(config.seed, None);
        assert!(!config.intro);
    }

    #[test]
    fn test_builder_chain() {
        let config = SwarmConfig::new()
            .with_particle_count(500)
            .with_cpu_particle_count(50)
            .with_canvas(800.0, 600.0)
            .with_spring(0.2, 0.5)
            .with_seed(3)
            .with_intro(true);

        assert_eq!(config.particle_count, 500);
        assert_eq!(config.cpu_particle_count, 50);
        assert_eq!(config.canvas, Vec2::new(800.0, 600.0));
        assert_eq!(config.spawn_origin, Vec2::new(400.0, 540.0));
        assert!((config.spring_force - 0.2).abs() < 1e-6);
        assert!((config.damping - 0.5).abs() < 1e-6);
        assert_eq!(config.seed, Some(3));
        assert!(config.intro);
    }
}
