//! Dual-source wave interference.
//!
//! Two fixed point sources emit circular sine waves; the field value at a
//! point is the sum of both, so it always lies in `[-2, 2]`. The swarm uses
//! it as a small "breathing skin" offset on spring targets and as a color
//! highlight weight.

use glam::Vec2;

use crate::config::WaveConfig;

/// Pure interference function over a fixed pair of sources.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveField {
    config: WaveConfig,
}

impl WaveField {
    pub fn new(config: WaveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Field value at `(x, y)` for `time` in seconds.
    #[inline]
    pub fn interference(&self, x: f32, y: f32, time: f32) -> f32 {
        self.interference_at(Vec2::new(x, y), time, 0.0)
    }

    /// Field value with a per-particle phase offset added to both terms.
    #[inline]
    pub fn interference_at(&self, p: Vec2, time: f32, phase: f32) -> f32 {
        let c = &self.config;
        let d1 = p.distance(c.source1);
        let d2 = p.distance(c.source2);
        let shift = time * c.speed - phase;
        (d1 * c.frequency - shift).sin() + (d2 * c.frequency - shift).sin()
    }

    /// Displacement amplitude for a music intensity in `[0, 1]`.
    #[inline]
    pub fn amplitude(&self, music_intensity: f32) -> f32 {
        self.config.base_amplitude * (1.0 + music_intensity * 2.0)
    }

    /// WGSL `interference` function with the sources baked in.
    pub fn to_wgsl(&self) -> String {
        let c = &self.config;
        format!(
            r#"const WAVE_S1: vec2<f32> = vec2<f32>({s1x:?}, {s1y:?});
const WAVE_S2: vec2<f32> = vec2<f32>({s2x:?}, {s2y:?});
const WAVE_FREQ: f32 = {freq:?};
const WAVE_SPEED: f32 = {speed:?};

fn interference(p: vec2<f32>, time: f32, phase: f32) -> f32 {{
    let d1 = distance(p, WAVE_S1);
    let d2 = distance(p, WAVE_S2);
    let shift = time * WAVE_SPEED - phase;
    return sin(d1 * WAVE_FREQ - shift) + sin(d2 * WAVE_FREQ - shift);
}}

fn highlight(value: f32) -> f32 {{
    return clamp((value + 1.0) * 0.5, 0.0, 1.0);
}}"#,
            s1x = c.source1.x,
            s1y = c.source1.y,
            s2x = c.source2.x,
            s2y = c.source2.y,
            freq = c.frequency,
            speed = c.speed,
        )
    }
}

/// Highlight weight for a field value: `-1` maps to 0 and `1` to 1, clamped.
#[inline]
pub fn highlight(value: f32) -> f32 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}

impl Default for WaveField {
    fn default() -> Self {
        Self::new(WaveConfig::default())
    }
}
