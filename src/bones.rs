//! Procedural humanoid silhouette.
//!
//! Seven fixed body regions, each a disc with an anchor, a radius and a
//! share of the particles. Particles are assigned to regions by index in
//! table order, so region membership is positional and survives a model
//! reload unchanged.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::config::SwarmConfig;
use crate::particle::Particle;

/// Jitter applied around each region's color bias.
const COLOR_JITTER: f32 = 0.05;

/// One body region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneRegion {
    pub name: &'static str,
    pub anchor: Vec2,
    pub radius: f32,
    /// Share of [`BASE_TOTAL`] particles.
    pub particle_count: u32,
    /// Gradient position: 0 gold, 0.5 purple, 1 cyan.
    pub color_bias: f32,
}

/// The silhouette, in fill order. Counts sum to [`BASE_TOTAL`].
pub const REGIONS: [BoneRegion; 7] = [
    BoneRegion { name: "head", anchor: Vec2::new(0.0, -60.0), radius: 20.0, particle_count: 1500, color_bias: 0.0 },
    BoneRegion { name: "torso", anchor: Vec2::new(0.0, -20.0), radius: 28.0, particle_count: 3000, color_bias: 1.0 },
    BoneRegion { name: "left_arm", anchor: Vec2::new(-36.0, -16.0), radius: 10.0, particle_count: 1200, color_bias: 0.5 },
    BoneRegion { name: "right_arm", anchor: Vec2::new(36.0, -16.0), radius: 10.0, particle_count: 1200, color_bias: 0.5 },
    BoneRegion { name: "left_leg", anchor: Vec2::new(-16.0, 24.0), radius: 12.0, particle_count: 1500, color_bias: 1.0 },
    BoneRegion { name: "right_leg", anchor: Vec2::new(16.0, 24.0), radius: 12.0, particle_count: 1500, color_bias: 1.0 },
    BoneRegion { name: "aura", anchor: Vec2::new(0.0, -10.0), radius: 64.0, particle_count: 2100, color_bias: 0.0 },
];

/// Particle total the region table was authored for.
pub const BASE_TOTAL: u32 = 12_000;

const _: () = {
    let mut sum = 0;
    let mut i = 0;
    while i < REGIONS.len() {
        sum += REGIONS[i].particle_count;
        i += 1;
    }
    assert!(sum == BASE_TOTAL);
};

/// Per-region particle counts for `total` particles.
///
/// Counts scale proportionally with rounding, never exceed what is left,
/// and the last region absorbs the remainder, so the sum is always exactly
/// `total`.
pub fn region_counts(total: u32) -> [u32; 7] {
    let mut counts = [0u32; 7];
    let mut remaining = total;
    let last = REGIONS.len() - 1;
    for (i, region) in REGIONS.iter().enumerate().take(last) {
        let scaled = (region.particle_count as u64 * total as u64) as f64 / BASE_TOTAL as f64;
        let n = (scaled.round() as u32).min(remaining);
        counts[i] = n;
        remaining -= n;
    }
    counts[last] = remaining;
    counts
}

/// Region index of every particle slot, in order.
pub fn region_of(index: u32, total: u32) -> Option<usize> {
    let mut end = 0;
    for (i, n) in region_counts(total).iter().enumerate() {
        end += n;
        if index < end {
            return Some(i);
        }
    }
    None
}

/// Uniform point inside a region's disc (uniform in angle and radius).
pub fn sample_region<R: Rng + ?Sized>(region: &BoneRegion, rng: &mut R) -> Vec2 {
    let angle = rng.gen::<f32>() * TAU;
    let r = rng.gen::<f32>() * region.radius;
    region.anchor + Vec2::new(angle.cos(), angle.sin()) * r
}

/// Home positions and color biases for `total` particles.
pub fn generate_homes<R: Rng + ?Sized>(total: u32, rng: &mut R) -> Vec<(Vec2, f32)> {
    let counts = region_counts(total);
    let mut homes = Vec::with_capacity(total as usize);
    for (region, &n) in REGIONS.iter().zip(counts.iter()) {
        for _ in 0..n {
            let home = sample_region(region, rng);
            let jitter = (rng.gen::<f32>() - 0.5) * 2.0 * COLOR_JITTER;
            homes.push((home, (region.color_bias + jitter).clamp(0.0, 1.0)));
        }
    }
    homes
}

/// Fresh particles resting on the silhouette around `config.spawn_origin`.
pub fn generate<R: Rng + ?Sized>(total: u32, config: &SwarmConfig, rng: &mut R) -> Vec<Particle> {
    generate_homes(total, rng)
        .into_iter()
        .map(|(home, color_blend)| {
            let size = config.size_min + rng.gen::<f32>() * config.size_range;
            let phase = rng.gen::<f32>() * TAU;
            Particle::at_rest(config.spawn_origin, home, color_blend, size, phase)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_base_counts_are_unchanged() {
        let counts = region_counts(BASE_TOTAL);
        let base: Vec<u32> = REGIONS.iter().map(|r| r.particle_count).collect();
        assert_eq!(counts.to_vec(), base);
    }

    #[test]
    fn test_counts_sum_to_total() {
        for total in [0, 1, 2, 3, 6, 7, 13, 100, 299, 300, 301, 1000, 4097, 12_000, 50_000] {
            let counts = region_counts(total);
            assert_eq!(counts.iter().sum::<u32>(), total, "total {}", total);
        }
    }

    #[test]
    fn test_placeholder_counts_are_proportional() {
        // 300 = 12000 / 40
        let counts = region_counts(300);
        assert_eq!(counts, [38, 75, 30, 30, 38, 38, 51]);
    }

    #[test]
    fn test_counts_are_deterministic() {
        assert_eq!(region_counts(777), region_counts(777));
    }

    #[test]
    fn test_generated_homes_stay_in_their_discs() {
        let mut rng = StdRng::seed_from_u64(1);
        let total = 600;
        let homes = generate_homes(total, &mut rng);
        assert_eq!(homes.len(), total as usize);

        for (i, (home, bias)) in homes.iter().enumerate() {
            let region = &REGIONS[region_of(i as u32, total).unwrap()];
            assert!(home.distance(region.anchor) <= region.radius + 1e-3);
            assert!((bias - region.color_bias).abs() <= COLOR_JITTER + 1e-6);
            assert!((0.0..=1.0).contains(bias));
        }
    }

    #[test]
    fn test_generate_particles() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = SwarmConfig::new();
        let particles = generate(300, &config, &mut rng);
        assert_eq!(particles.len(), 300);
        for p in &particles {
            assert_eq!(p.life, 1.0);
            assert_eq!(p.velocity, [0.0, 0.0]);
            assert!(p.size >= 1.0 && p.size < 3.0);
            assert!(p.phase >= 0.0 && p.phase < TAU);
            assert!((p.position() - (config.spawn_origin + p.home())).length() < 1e-3);
        }
    }

    #[test]
    fn test_region_of_out_of_range() {
        assert_eq!(region_of(0, 300), Some(0));
        assert_eq!(region_of(299, 300), Some(6));
        assert_eq!(region_of(300, 300), None);
    }
}
