//! Per-frame inputs and the backend sum type.
//!
//! Both backends advance particles with the same equations. The helpers in
//! this module are the Rust statement of those equations; the compute
//! shader in [`gpu::shaders`](crate::gpu::shaders) spells them out again in
//! WGSL, term for term.

use std::f64::consts::TAU;
use std::fmt;

use glam::Vec2;

use crate::config::{BreatheConfig, WaveConfig};
use crate::cpu::CpuBackend;
use crate::gpu::GpuBackend;

/// Vertical offset of the spring target above the anchor, in pixels.
pub const TARGET_LIFT: f32 = 20.0;

/// Share of the wave displacement applied horizontally.
pub const WAVE_X: f32 = 0.3;

/// Share of the wave displacement applied vertically.
pub const WAVE_Y: f32 = 0.2;

/// Everything a backend needs to advance one frame, besides reactions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    /// Character anchor in canvas pixels.
    pub target: Vec2,
    /// Milliseconds since the swarm started.
    pub time_ms: f64,
    /// Seconds since the previous frame.
    pub dt: f32,
    pub combo_glow: f32,
    /// Music intensity in `[0, 1]`.
    pub music_intensity: f32,
    /// Multiplier on the configured spring force. Below 1 during the intro.
    pub spring_scale: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            time_ms: 0.0,
            dt: 0.0,
            combo_glow: 0.0,
            music_intensity: 0.0,
            spring_scale: 1.0,
        }
    }
}

impl FrameParams {
    /// Breathing clock in milliseconds, reduced to one breathing period so
    /// it stays precise as `f32` in long sessions.
    #[inline]
    pub fn breathe_time_ms(&self, breathe: &BreatheConfig) -> f32 {
        reduce(self.time_ms, TAU / breathe.speed as f64) as f32
    }

    /// Wave clock in seconds, reduced to one wave period.
    #[inline]
    pub fn wave_time(&self, wave: &WaveConfig) -> f32 {
        reduce(self.time_ms * 0.001, TAU / wave.speed as f64) as f32
    }
}

/// `t` modulo `period`. Non-positive or non-finite periods leave `t` alone.
fn reduce(t: f64, period: f64) -> f64 {
    if period.is_finite() && period > 0.0 {
        t.rem_euclid(period)
    } else {
        t
    }
}

/// Vertical breathing offset shared by every particle.
#[inline]
pub fn breathe_offset(time_ms: f32, breathe: &BreatheConfig) -> f32 {
    (time_ms * breathe.speed).sin() * breathe.amount
}

/// Where the spring pulls a particle this frame.
///
/// `wave` is the already-scaled wave displacement.
#[inline]
pub fn spring_target(anchor: Vec2, home: Vec2, breathe: f32, wave: f32) -> Vec2 {
    Vec2::new(
        anchor.x + home.x + wave * WAVE_X,
        anchor.y - TARGET_LIFT + home.y + breathe + wave * WAVE_Y,
    )
}

/// Which backend a swarm runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Gpu,
    Cpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gpu => f.write_str("gpu"),
            BackendKind::Cpu => f.write_str("cpu"),
        }
    }
}

/// The active simulation backend. Chosen once at init and never switched.
pub enum Backend {
    Gpu(GpuBackend),
    Cpu(CpuBackend),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Gpu(_) => BackendKind::Gpu,
            Backend::Cpu(_) => BackendKind::Cpu,
        }
    }

    pub fn particle_count(&self) -> u32 {
        match self {
            Backend::Gpu(gpu) => gpu.particle_count(),
            Backend::Cpu(cpu) => cpu.particle_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_target_terms() {
        let t = spring_target(Vec2::new(100.0, 200.0), Vec2::new(5.0, -7.0), 3.0, 10.0);
        assert!((t.x - (100.0 + 5.0 + 3.0)).abs() < 1e-5);
        assert!((t.y - (200.0 - 20.0 - 7.0 + 3.0 + 2.0)).abs() < 1e-5);
    }

    #[test]
    fn test_breathe_offset() {
        let breathe = BreatheConfig::default();
        assert_eq!(breathe_offset(0.0, &breathe), 0.0);
        // Quarter period: sin(pi/2) * 8
        let quarter = std::f32::consts::FRAC_PI_2 / breathe.speed;
        assert!((breathe_offset(quarter, &breathe) - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_wave_time_is_seconds() {
        let frame = FrameParams { time_ms: 2500.0, ..Default::default() };
        assert!((frame.wave_time(&WaveConfig::default()) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_clocks_stay_precise_in_long_sessions() {
        let breathe = BreatheConfig::default();
        let wave = WaveConfig::default();
        // Ten hours in, plus a fraction of a millisecond
        let base = 36_000_000.0;

        for offset in [0.0, 0.25, 0.5] {
            let frame = FrameParams { time_ms: base + offset, ..Default::default() };

            let exact = ((base + offset) * breathe.speed as f64).sin();
            let reduced = (frame.breathe_time_ms(&breathe) * breathe.speed).sin() as f64;
            assert!((exact - reduced).abs() < 1e-4, "{} vs {}", exact, reduced);

            let exact = ((base + offset) * 0.001 * wave.speed as f64).sin();
            let reduced = (frame.wave_time(&wave) * wave.speed).sin() as f64;
            assert!((exact - reduced).abs() < 1e-4, "{} vs {}", exact, reduced);
        }

        let a = FrameParams { time_ms: base, ..Default::default() };
        let b = FrameParams { time_ms: base + 0.5, ..Default::default() };
        assert_ne!(a.breathe_time_ms(&breathe), b.breathe_time_ms(&breathe));
    }

    #[test]
    fn test_zero_speed_leaves_clock_alone() {
        let breathe = BreatheConfig { speed: 0.0, ..BreatheConfig::default() };
        let frame = FrameParams { time_ms: 1500.0, ..Default::default() };
        assert_eq!(frame.breathe_time_ms(&breathe), 1500.0);
    }
}
