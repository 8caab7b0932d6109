//! The particle record shared by both simulation backends.
//!
//! A [`Particle`] is ten packed `f32` values. The CPU backend stores a
//! `Vec<Particle>` and the GPU backend uploads the same bytes into a storage
//! buffer, so the layout here and [`WGSL_STRUCT`] must stay in lockstep.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Number of `f32` values in one particle.
pub const PARTICLE_FLOATS: usize = 10;

/// Byte stride of one particle in the GPU storage buffer.
pub const PARTICLE_STRIDE: usize = PARTICLE_FLOATS * 4;

const _: () = assert!(std::mem::size_of::<Particle>() == PARTICLE_STRIDE);

/// WGSL declaration matching [`Particle`] byte for byte.
///
/// `vec2<f32>` has 8-byte alignment, so the field order below packs to
/// exactly 40 bytes with no implicit padding.
pub const WGSL_STRUCT: &str = r#"struct Particle {
    position: vec2<f32>,
    velocity: vec2<f32>,
    home: vec2<f32>,
    color_blend: f32,
    size: f32,
    life: f32,
    phase: f32,
};"#;

/// One simulated point of the character swarm.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Current rendered location in canvas pixels.
    pub position: [f32; 2],
    /// Spring-integrator velocity in pixels per frame.
    pub velocity: [f32; 2],
    /// Rest-pose offset from the character anchor.
    pub home: [f32; 2],
    /// Position on the gold → purple → cyan gradient, 0..1.
    pub color_blend: f32,
    /// Render size in pixels.
    pub size: f32,
    /// Always 1.0 for character particles.
    pub life: f32,
    /// Per-particle offset in radians, 0..2π.
    pub phase: f32,
}

impl Particle {
    /// Create a particle resting at `origin + home`.
    pub fn at_rest(origin: Vec2, home: Vec2, color_blend: f32, size: f32, phase: f32) -> Self {
        let position = origin + home;
        Self {
            position: position.to_array(),
            velocity: [0.0; 2],
            home: home.to_array(),
            color_blend,
            size,
            life: 1.0,
            phase,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    #[inline]
    pub fn home(&self) -> Vec2 {
        Vec2::from_array(self.home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_is_ten_floats() {
        assert_eq!(std::mem::size_of::<Particle>(), 40);
        assert_eq!(std::mem::align_of::<Particle>(), 4);

        let p = Particle::at_rest(Vec2::new(10.0, 20.0), Vec2::new(1.0, -2.0), 0.5, 2.0, 1.0);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&p));
        assert_eq!(floats, &[11.0, 18.0, 0.0, 0.0, 1.0, -2.0, 0.5, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_wgsl_struct_field_order() {
        let fields: Vec<&str> = WGSL_STRUCT
            .lines()
            .filter_map(|l| l.trim().split(':').next())
            .filter(|name| !name.is_empty() && !name.starts_with("struct") && !name.starts_with('}'))
            .collect();
        assert_eq!(
            fields,
            ["position", "velocity", "home", "color_blend", "size", "life", "phase"]
        );
    }
}
