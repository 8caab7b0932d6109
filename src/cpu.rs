//! Single-threaded fallback backend.
//!
//! Mirrors the compute shader's per-invocation logic in a plain loop over a
//! `Vec<Particle>`, and draws onto a [`Canvas`] instead of a render pass.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::{breathe_offset, spring_target, FrameParams};
use crate::canvas::{BlendMode, Canvas};
use crate::config::SwarmConfig;
use crate::model::HomePositions;
use crate::palette::particle_color;
use crate::particle::Particle;
use crate::reactions::ModifierBundle;
use crate::wave::WaveField;

/// CPU mirror of the particle simulation.
pub struct CpuBackend {
    particles: Vec<Particle>,
    config: SwarmConfig,
    wave: WaveField,
    rng: StdRng,
    last_frame: FrameParams,
}

impl CpuBackend {
    pub fn new(particles: Vec<Particle>, config: &SwarmConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            particles,
            config: config.clone(),
            wave: WaveField::new(config.wave),
            rng,
            last_frame: FrameParams::default(),
        }
    }

    pub fn particle_count(&self) -> u32 {
        self.particles.len() as u32
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Wave displacement amplitude used by the most recent update.
    pub fn wave_amplitude(&self) -> f32 {
        self.wave.amplitude(self.last_frame.music_intensity)
    }

    /// Advance every particle one frame.
    pub fn update(&mut self, frame: &FrameParams, modifiers: &ModifierBundle) {
        let Self {
            particles,
            config,
            wave,
            rng,
            last_frame,
        } = self;

        let breathe = breathe_offset(frame.breathe_time_ms(&config.breathe), &config.breathe);
        let amplitude = wave.amplitude(frame.music_intensity);
        let wave_time = frame.wave_time(&config.wave);
        let spring = config.spring_force * frame.spring_scale;

        for p in particles.iter_mut() {
            let home = p.home();
            let offset = wave.interference_at(home, wave_time, p.phase) * amplitude;
            let goal = spring_target(frame.target, home, breathe, offset);

            let mut velocity = p.velocity() + (goal - p.position()) * spring;
            if modifiers.velocity_burst > 0.0 {
                let angle = rng.gen::<f32>() * TAU;
                let magnitude = rng.gen::<f32>() * modifiers.velocity_burst;
                velocity += Vec2::from_angle(angle) * magnitude;
            }
            velocity *= config.damping;

            p.velocity = velocity.to_array();
            p.position = (p.position() + velocity).to_array();
            p.size = config.size_min + rng.gen::<f32>() * config.size_range + modifiers.scale_burst;
        }

        *last_frame = *frame;
    }

    /// Draw every particle as a small square centered on its position.
    pub fn render(&self, canvas: &mut dyn Canvas, modifiers: &ModifierBundle, combo_glow: f32) {
        let wave_time = self.last_frame.wave_time(&self.config.wave);
        for p in &self.particles {
            let wave = self.wave.interference_at(p.home(), wave_time, p.phase);
            let color = particle_color(&self.config.palette, p.color_blend, wave, p.phase, modifiers, combo_glow);
            let half = p.size * 0.5;
            canvas.fill_rect(
                p.position[0] - half,
                p.position[1] - half,
                p.size,
                p.size,
                color,
                BlendMode::Screen,
            );
        }
    }

    /// Replace home positions in index order. Extra entries are ignored.
    pub fn write_home_positions(&mut self, homes: &HomePositions) {
        for (p, home) in self.particles.iter_mut().zip(homes.iter()) {
            p.home = home.to_array();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::FrameBuffer;
    use crate::palette::Color;

    fn single(home: Vec2, position: Vec2, phase: f32) -> Vec<Particle> {
        let mut p = Particle::at_rest(Vec2::ZERO, home, 0.5, 2.0, phase);
        p.position = position.to_array();
        vec![p]
    }

    fn config() -> SwarmConfig {
        SwarmConfig::new().with_seed(11)
    }

    #[test]
    fn test_update_follows_spring_equation() {
        let config = config();
        let home = Vec2::new(4.0, -6.0);
        let start = Vec2::new(50.0, 60.0);
        let mut cpu = CpuBackend::new(single(home, start, 0.7), &config);

        let frame = FrameParams {
            target: Vec2::new(100.0, 200.0),
            time_ms: 1234.0,
            dt: 1.0 / 60.0,
            combo_glow: 0.0,
            music_intensity: 0.0,
            spring_scale: 1.0,
        };
        cpu.update(&frame, &ModifierBundle::NONE);

        let wave = WaveField::new(config.wave);
        let breathe = (1234.0f32 * config.breathe.speed).sin() * config.breathe.amount;
        let offset = wave.interference_at(home, 1.234, 0.7) * config.wave.base_amplitude;
        let goal = Vec2::new(
            100.0 + home.x + offset * 0.3,
            200.0 - 20.0 + home.y + breathe + offset * 0.2,
        );
        let velocity = (goal - start) * config.spring_force * config.damping;

        let p = cpu.particles()[0];
        assert!((p.velocity() - velocity).length() < 1e-3);
        assert!((p.position() - (start + velocity)).length() < 1e-3);
        assert!(p.size >= 1.0 && p.size < 3.0);
        assert_eq!(p.home(), home);
    }

    #[test]
    fn test_zero_spring_scale_holds_particles() {
        let start = Vec2::new(50.0, 60.0);
        let mut cpu = CpuBackend::new(single(Vec2::ZERO, start, 0.0), &config());
        let frame = FrameParams { target: Vec2::new(300.0, 300.0), spring_scale: 0.0, ..Default::default() };
        cpu.update(&frame, &ModifierBundle::NONE);
        assert_eq!(cpu.particles()[0].position(), start);
        assert_eq!(cpu.particles()[0].velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_music_scales_wave_amplitude() {
        let config = config();
        let mut cpu = CpuBackend::new(single(Vec2::ZERO, Vec2::ZERO, 0.0), &config);
        let frame = FrameParams { music_intensity: 0.9, ..Default::default() };
        cpu.update(&frame, &ModifierBundle::NONE);
        let expected = config.wave.base_amplitude * 2.8;
        assert!((cpu.wave_amplitude() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_scale_burst_adds_to_size() {
        let mut cpu = CpuBackend::new(single(Vec2::ZERO, Vec2::ZERO, 0.0), &config());
        let modifiers = ModifierBundle { scale_burst: 1.5, ..ModifierBundle::NONE };
        cpu.update(&FrameParams::default(), &modifiers);
        let size = cpu.particles()[0].size;
        assert!(size >= 2.5 && size < 4.5);
    }

    #[test]
    fn test_velocity_burst_kicks_particles_apart() {
        let config = config();
        let particles: Vec<Particle> = (0..50)
            .map(|_| Particle::at_rest(Vec2::ZERO, Vec2::ZERO, 0.5, 2.0, 0.0))
            .collect();

        // Everything sits exactly on its spring target at t = 0
        let frame = FrameParams { target: Vec2::new(0.0, 20.0), ..Default::default() };
        let mut calm = CpuBackend::new(particles.clone(), &config);
        calm.update(&frame, &ModifierBundle::NONE);
        let calm_spread: f32 = calm.particles().iter().map(|p| p.velocity().length()).sum();

        let mut burst = CpuBackend::new(particles, &config);
        let modifiers = ModifierBundle { velocity_burst: 8.0, ..ModifierBundle::NONE };
        burst.update(&frame, &modifiers);
        let burst_spread: f32 = burst.particles().iter().map(|p| p.velocity().length()).sum();

        assert!(burst_spread > calm_spread + 1.0);
        for p in burst.particles() {
            // kick magnitude < 8, then damped by 0.8, plus the (tiny) spring pull
            assert!(p.velocity().length() < 8.0 * config.damping + 1.0);
        }
    }

    #[test]
    fn test_write_home_positions_keeps_count() {
        let particles: Vec<Particle> = (0..3)
            .map(|i| Particle::at_rest(Vec2::ZERO, Vec2::splat(i as f32), 0.1 * i as f32, 2.0, 0.0))
            .collect();
        let mut cpu = CpuBackend::new(particles, &config());
        let mut homes = HomePositions::default();
        for i in 0..5 {
            homes.push(Vec2::new(10.0 * i as f32, -1.0));
        }
        cpu.write_home_positions(&homes);
        assert_eq!(cpu.particle_count(), 3);
        assert_eq!(cpu.particles()[2].home, [20.0, -1.0]);
        // Colors are positional and untouched
        assert!((cpu.particles()[2].color_blend - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_render_draws_onto_canvas() {
        let mut cpu = CpuBackend::new(single(Vec2::ZERO, Vec2::new(10.0, 10.0), 0.0), &config());
        let mut fb = FrameBuffer::new(32, 32);
        cpu.render(&mut fb, &ModifierBundle::NONE, 0.0);
        let black = Color::rgb(0.0, 0.0, 0.0);
        assert!(fb.count_changed(black) > 0);
        assert_ne!(fb.pixel(10, 10), Some(black));
        assert_eq!(fb.pixel(20, 20), Some(black));
    }
}
