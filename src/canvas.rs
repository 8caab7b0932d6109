//! 2D drawing surface for the CPU path.
//!
//! The CPU backend, [`FxPool`](crate::fx::FxPool) and
//! [`BallTrails`](crate::fx::BallTrails) draw through the [`Canvas`] trait.
//! [`FrameBuffer`] is a software implementation that hosts can blit to a
//! window or texture, and that tests can inspect pixel by pixel.

use crate::palette::Color;

/// How a drawn color combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending (default).
    #[default]
    Alpha,

    /// Colors are added, scaled by source alpha. Overlaps get brighter.
    Additive,

    /// `1 - (1 - dst) * (1 - src)`. Brightens without clipping as fast as
    /// additive; used for the character swarm on the CPU path.
    Screen,
}

impl BlendMode {
    /// Equivalent wgpu blend state.
    ///
    /// `Screen` has no fixed-function equivalent and maps to additive.
    pub fn to_wgpu(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive | BlendMode::Screen => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }

    /// Blend one channel.
    #[inline]
    fn apply(self, dst: f32, src: f32, alpha: f32) -> f32 {
        match self {
            BlendMode::Alpha => dst + (src - dst) * alpha,
            BlendMode::Additive => (dst + src * alpha).min(1.0),
            BlendMode::Screen => 1.0 - (1.0 - dst) * (1.0 - (src * alpha).clamp(0.0, 1.0)),
        }
    }
}

/// Immediate-mode 2D drawing in canvas pixels (origin top-left, y down).
pub trait Canvas {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, blend: BlendMode);

    /// Fill a circle.
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, blend: BlendMode);
}

/// Software RGBA canvas with `f32` channels.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 1.0]; (width as usize) * (height as usize)],
        }
    }

    /// Fill every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_array());
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [r, g, b, a] = self.pixels[(y * self.width + x) as usize];
        Some(Color::rgba(r, g, b, a))
    }

    /// Pixels as packed 8-bit RGBA rows, ready for upload or saving.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&[r, g, b, a]| Color::rgba(r, g, b, a).to_rgba8())
            .collect()
    }

    /// Number of pixels that differ from `background`.
    pub fn count_changed(&self, background: Color) -> usize {
        let bg = background.to_array();
        self.pixels.iter().filter(|p| **p != bg).count()
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Color, blend: BlendMode) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let px = &mut self.pixels[(y as usize) * (self.width as usize) + x as usize];
        px[0] = blend.apply(px[0], color.r, color.a);
        px[1] = blend.apply(px[1], color.g, color.a);
        px[2] = blend.apply(px[2], color.b, color.a);
    }
}

impl Canvas for FrameBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, blend: BlendMode) {
        if !(x.is_finite() && y.is_finite() && w > 0.0 && h > 0.0) {
            return;
        }
        let x0 = (x.floor() as i64).max(0);
        let y0 = (y.floor() as i64).max(0);
        let x1 = ((x + w).ceil() as i64).min(self.width as i64);
        let y1 = ((y + h).ceil() as i64).min(self.height as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, blend);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, blend: BlendMode) {
        if !(cx.is_finite() && cy.is_finite() && radius > 0.0) {
            return;
        }
        let r2 = radius * radius;
        let y0 = ((cy - radius).floor() as i64).max(0);
        let y1 = ((cy + radius).ceil() as i64).min(self.height as i64);
        let x0 = ((cx - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64).min(self.width as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(px, py, color, blend);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    #[test]
    fn test_fill_rect_covers_pixels() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.fill_rect(2.0, 3.0, 2.0, 2.0, Color::WHITE, BlendMode::Alpha);
        assert_eq!(fb.count_changed(BLACK), 4);
        assert_eq!(fb.pixel(2, 3), Some(Color::WHITE));
        assert_eq!(fb.pixel(4, 3), Some(BLACK));
    }

    #[test]
    fn test_off_canvas_draws_are_clipped() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill_rect(-10.0, -10.0, 5.0, 5.0, Color::WHITE, BlendMode::Alpha);
        fb.fill_rect(100.0, 1.0, 5.0, 5.0, Color::WHITE, BlendMode::Alpha);
        fb.fill_circle(f32::NAN, 1.0, 3.0, Color::WHITE, BlendMode::Alpha);
        assert_eq!(fb.count_changed(BLACK), 0);
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_circle() {
        let mut fb = FrameBuffer::new(16, 16);
        fb.fill_circle(8.0, 8.0, 3.0, Color::WHITE, BlendMode::Alpha);
        let changed = fb.count_changed(BLACK);
        // Roughly pi * r^2
        assert!((20..=36).contains(&changed), "{}", changed);
        assert_eq!(fb.pixel(8, 8), Some(Color::WHITE));
        assert_eq!(fb.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_blend_modes() {
        let half = Color::rgba(1.0, 0.5, 0.0, 0.5);

        let mut fb = FrameBuffer::new(1, 1);
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, half, BlendMode::Alpha);
        let p = fb.pixel(0, 0).unwrap();
        assert!((p.r - 0.5).abs() < 1e-6 && (p.g - 0.25).abs() < 1e-6);

        let mut fb = FrameBuffer::new(1, 1);
        fb.clear(Color::rgb(0.8, 0.8, 0.8));
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, half, BlendMode::Additive);
        let p = fb.pixel(0, 0).unwrap();
        assert_eq!(p.r, 1.0);
        assert!((p.g - 1.0).abs() < 1e-6);

        let mut fb = FrameBuffer::new(1, 1);
        fb.clear(Color::rgb(0.5, 0.5, 0.5));
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, half, BlendMode::Screen);
        let p = fb.pixel(0, 0).unwrap();
        // 1 - 0.5 * (1 - 0.5) = 0.75
        assert!((p.r - 0.75).abs() < 1e-6);
        assert!(p.r <= 1.0);
    }

    #[test]
    fn test_to_rgba8() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.fill_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE, BlendMode::Alpha);
        assert_eq!(fb.to_rgba8(), vec![255, 255, 255, 255, 0, 0, 0, 255]);
    }
}
