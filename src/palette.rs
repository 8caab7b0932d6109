//! Particle coloring.
//!
//! The render shader and the CPU fallback color particles with the same
//! function. [`particle_color`] is the Rust side and [`Palette::to_wgsl`]
//! emits the WGSL side with the palette stops baked in as constants.

use std::f32::consts::TAU;

use crate::reactions::ModifierBundle;
use crate::wave::highlight;

/// Linear RGBA color, components 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `rrggbb`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(
            channel(0)? as f32 / 255.0,
            channel(2)? as f32 / 255.0,
            channel(4)? as f32 / 255.0,
        ))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Pack into 8-bit RGBA.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// The three gradient stops plus the steady-state highlight color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub gold: Color,
    pub purple: Color,
    pub cyan: Color,
    /// Color the wave pattern and glow reactions blend toward.
    pub highlight: Color,
    /// Base opacity before flicker.
    pub opacity: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            gold: Color::rgb(1.0, 193.0 / 255.0, 7.0 / 255.0),
            purple: Color::rgb(107.0 / 255.0, 92.0 / 255.0, 231.0 / 255.0),
            cyan: Color::rgb(0.0, 212.0 / 255.0, 1.0),
            highlight: Color::rgb(1.0, 193.0 / 255.0, 7.0 / 255.0),
            opacity: 0.8,
        }
    }
}

impl Palette {
    /// Sample the gold → purple → cyan gradient.
    pub fn gradient(&self, blend: f32) -> Color {
        let blend = blend.clamp(0.0, 1.0);
        if blend < 0.5 {
            self.gold.lerp(self.purple, blend * 2.0)
        } else {
            self.purple.lerp(self.cyan, (blend - 0.5) * 2.0)
        }
    }

    /// WGSL constants and helpers mirroring [`Palette::gradient`],
    /// [`hue_to_rgb`] and [`particle_color`]. Expects the wave field's
    /// `highlight` function in the same module.
    pub fn to_wgsl(&self) -> String {
        let v = |c: Color| format!("vec3<f32>({:?}, {:?}, {:?})", c.r, c.g, c.b);
        format!(
            r#"const GOLD: vec3<f32> = {gold};
const PURPLE: vec3<f32> = {purple};
const CYAN: vec3<f32> = {cyan};
const HIGHLIGHT: vec3<f32> = {highlight};
const OPACITY: f32 = {opacity:?};
const TAU: f32 = 6.283185307179586;

fn gradient(blend_in: f32) -> vec3<f32> {{
    let blend = clamp(blend_in, 0.0, 1.0);
    if blend < 0.5 {{
        return mix(GOLD, PURPLE, blend * 2.0);
    }}
    return mix(PURPLE, CYAN, (blend - 0.5) * 2.0);
}}

fn hue_to_rgb(hue_deg: f32) -> vec3<f32> {{
    let h = fract(hue_deg / 360.0);
    let k = vec3<f32>(h, h + 2.0 / 3.0, h + 1.0 / 3.0);
    return clamp(abs(fract(k) * 6.0 - 3.0) - 1.0, vec3<f32>(0.0), vec3<f32>(1.0));
}}

fn particle_color(
    blend: f32,
    wave: f32,
    phase: f32,
    color_shift: f32,
    combo_glow: f32,
    flicker_alpha: f32,
    celebrate_hue: f32,
) -> vec4<f32> {{
    var rgb = gradient(blend);
    rgb = mix(rgb, HIGHLIGHT, highlight(wave) * 0.3);
    rgb = mix(rgb, HIGHLIGHT, clamp(color_shift * 0.5, 0.0, 1.0));
    if celebrate_hue >= 0.0 {{
        rgb = hue_to_rgb(celebrate_hue + phase / TAU * 360.0);
    }}
    rgb = rgb * (1.0 + clamp(combo_glow, 0.0, 10.0) * 0.05);
    return vec4<f32>(rgb, OPACITY * flicker_alpha);
}}"#,
            gold = v(self.gold),
            purple = v(self.purple),
            cyan = v(self.cyan),
            highlight = v(self.highlight),
            opacity = self.opacity,
        )
    }
}

/// Fully saturated color for a hue in degrees. Hues wrap.
pub fn hue_to_rgb(hue_deg: f32) -> Color {
    let h = (hue_deg / 360.0).rem_euclid(1.0);
    let channel = |k: f32| ((k.rem_euclid(1.0) * 6.0 - 3.0).abs() - 1.0).clamp(0.0, 1.0);
    Color::rgb(channel(h), channel(h + 2.0 / 3.0), channel(h + 1.0 / 3.0))
}

/// Final color of one particle.
///
/// `wave` is the raw interference value in [-2, 2]; it lifts the color
/// toward the highlight by up to 30%.
pub fn particle_color(
    palette: &Palette,
    blend: f32,
    wave: f32,
    phase: f32,
    modifiers: &ModifierBundle,
    combo_glow: f32,
) -> Color {
    let mut rgb = palette.gradient(blend);
    rgb = rgb.lerp(palette.highlight, highlight(wave) * 0.3);
    rgb = rgb.lerp(palette.highlight, (modifiers.color_shift * 0.5).clamp(0.0, 1.0));
    if modifiers.celebrate_hue >= 0.0 {
        rgb = hue_to_rgb(modifiers.celebrate_hue + phase / TAU * 360.0);
    }
    let gain = 1.0 + combo_glow.clamp(0.0, 10.0) * 0.05;
    Color::rgba(
        rgb.r * gain,
        rgb.g * gain,
        rgb.b * gain,
        palette.opacity * modifiers.flicker_alpha,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-4
            && (a.g - b.g).abs() < 1e-4
            && (a.b - b.b).abs() < 1e-4
            && (a.a - b.a).abs() < 1e-4
    }

    #[test]
    fn test_from_hex() {
        let gold = Color::from_hex("#ffc107").unwrap();
        assert!(close(gold, Palette::default().gold));
        assert!(Color::from_hex("00d4ff").is_some());
        assert!(Color::from_hex("#fff").is_none());
        assert!(Color::from_hex("#gggggg").is_none());
    }

    #[test]
    fn test_gradient_stops() {
        let palette = Palette::default();
        assert!(close(palette.gradient(0.0), palette.gold));
        assert!(close(palette.gradient(0.5), palette.purple));
        assert!(close(palette.gradient(1.0), palette.cyan));
        // Out of range clamps
        assert!(close(palette.gradient(-3.0), palette.gold));
        assert!(close(palette.gradient(7.0), palette.cyan));
    }

    #[test]
    fn test_hue_to_rgb_primaries() {
        assert!(close(hue_to_rgb(0.0), Color::rgb(1.0, 0.0, 0.0)));
        assert!(close(hue_to_rgb(120.0), Color::rgb(0.0, 1.0, 0.0)));
        assert!(close(hue_to_rgb(240.0), Color::rgb(0.0, 0.0, 1.0)));
        assert!(close(hue_to_rgb(360.0), Color::rgb(1.0, 0.0, 0.0)));
        assert!(close(hue_to_rgb(-120.0), Color::rgb(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_particle_color_flicker_and_celebrate() {
        let palette = Palette::default();
        let mut modifiers = ModifierBundle::default();

        let idle = particle_color(&palette, 1.0, -1.0, 0.0, &modifiers, 0.0);
        assert!(close(idle, palette.cyan.with_alpha(0.8)));

        modifiers.flicker_alpha = 0.3;
        modifiers.celebrate_hue = 120.0;
        let c = particle_color(&palette, 1.0, -1.0, 0.0, &modifiers, 0.0);
        assert!(close(c, Color::rgba(0.0, 1.0, 0.0, 0.8 * 0.3)));
    }

    #[test]
    fn test_color_shift_moves_toward_highlight() {
        let palette = Palette::default();
        let mut modifiers = ModifierBundle::default();
        modifiers.color_shift = 2.0;
        let c = particle_color(&palette, 1.0, -1.0, 0.0, &modifiers, 0.0);
        assert!(close(c, palette.highlight.with_alpha(0.8)));
    }

    #[test]
    fn test_to_wgsl_bakes_stops() {
        let wgsl = Palette::default().to_wgsl();
        assert!(wgsl.contains("const GOLD: vec3<f32> = vec3<f32>(1.0,"));
        assert!(wgsl.contains("fn particle_color("));
        assert!(wgsl.contains("mix(rgb, HIGHLIGHT, highlight(wave) * 0.3)"));
    }
}
