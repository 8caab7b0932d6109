//! Text outlines as vertex clouds.
//!
//! [`GlyphVertexSource`] lays a string out on one baseline with a TrueType
//! or OpenType font, flattens the glyph outlines into polylines and spaces
//! a fixed number of points evenly along them. The `url` passed to
//! [`fetch`](VertexSource::fetch) is the text to render.
//!
//! ```ignore
//! let source = GlyphVertexSource::from_file("assets/DejaVuSans.ttf")?;
//! swarm.load_model(Arc::new(source), "GAME OVER");
//! ```
//!
//! Points are in font units with Y up, the same convention as OBJ files,
//! so [`sample`](crate::model::sample) centers, normalizes and flips them
//! like any other model.

use std::path::Path;

use glam::Vec2;
use ttf_parser::{Face, OutlineBuilder};

use crate::error::ModelError;
use crate::model::{VertexCloud, VertexSource};

/// Points produced per fetch unless configured otherwise.
pub const DEFAULT_POINT_COUNT: usize = 2000;

/// Line segments per quadratic or cubic curve.
pub const DEFAULT_CURVE_STEPS: u32 = 8;

/// Samples text outlines from font data held in memory.
#[derive(Clone, Debug)]
pub struct GlyphVertexSource {
    font: Vec<u8>,
    point_count: usize,
    curve_steps: u32,
}

impl GlyphVertexSource {
    /// Wrap font bytes. Fails if they are not a parseable font.
    pub fn new(font: Vec<u8>) -> Result<Self, ModelError> {
        Face::parse(&font, 0).map_err(|e| ModelError::Font(e.to_string()))?;
        Ok(Self {
            font,
            point_count: DEFAULT_POINT_COUNT,
            curve_steps: DEFAULT_CURVE_STEPS,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::new(std::fs::read(path)?)
    }

    /// Number of points per fetched string. At least 1.
    pub fn with_point_count(mut self, count: usize) -> Self {
        self.point_count = count.max(1);
        self
    }

    /// Segments per curve when flattening. At least 1.
    pub fn with_curve_steps(mut self, steps: u32) -> Self {
        self.curve_steps = steps.max(1);
        self
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Outline polylines for `text`, advancing the pen by each glyph's
    /// horizontal advance.
    fn outlines(&self, text: &str) -> Result<Vec<Vec<Vec2>>, ModelError> {
        let face = Face::parse(&self.font, 0).map_err(|e| ModelError::Font(e.to_string()))?;
        let fallback_advance = face.units_per_em() as f32 * 0.5;

        let mut flattener = Flattener::new(self.curve_steps);
        for c in text.chars() {
            let Some(id) = face.glyph_index(c) else {
                log::debug!("No glyph for {:?}, leaving a gap", c);
                flattener.offset.x += fallback_advance;
                continue;
            };
            face.outline_glyph(id, &mut flattener);
            flattener.finish_contour();
            let advance = face.glyph_hor_advance(id).map_or(fallback_advance, f32::from);
            flattener.offset.x += advance;
        }
        Ok(flattener.contours)
    }
}

impl VertexSource for GlyphVertexSource {
    fn fetch(&self, url: &str) -> Result<VertexCloud, ModelError> {
        let contours = self.outlines(url)?;
        let points = resample(&contours, self.point_count);
        log::debug!(
            "Sampled {} points from {} contours of {:?}",
            points.len(),
            contours.len(),
            url
        );
        VertexCloud::new(points.into_iter().map(|p| p.extend(0.0)).collect())
    }
}

/// Collects glyph outlines as closed polylines, splitting curves into
/// straight segments.
#[derive(Debug)]
struct Flattener {
    steps: u32,
    offset: Vec2,
    contours: Vec<Vec<Vec2>>,
    current: Vec<Vec2>,
    start: Vec2,
    last: Vec2,
}

impl Flattener {
    fn new(steps: u32) -> Self {
        Self {
            steps: steps.max(1),
            offset: Vec2::ZERO,
            contours: Vec::new(),
            current: Vec::new(),
            start: Vec2::ZERO,
            last: Vec2::ZERO,
        }
    }

    fn push(&mut self, p: Vec2) {
        self.current.push(p);
        self.last = p;
    }

    fn finish_contour(&mut self) {
        let contour = std::mem::take(&mut self.current);
        if contour.len() > 1 {
            self.contours.push(contour);
        }
    }
}

impl OutlineBuilder for Flattener {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish_contour();
        let p = self.offset + Vec2::new(x, y);
        self.start = p;
        self.push(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(self.offset + Vec2::new(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c = self.offset + Vec2::new(x1, y1);
        let p1 = self.offset + Vec2::new(x, y);
        for i in 1..=self.steps {
            let t = i as f32 / self.steps as f32;
            let u = 1.0 - t;
            self.push(p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c0 = self.offset + Vec2::new(x1, y1);
        let c1 = self.offset + Vec2::new(x2, y2);
        let p1 = self.offset + Vec2::new(x, y);
        for i in 1..=self.steps {
            let t = i as f32 / self.steps as f32;
            let u = 1.0 - t;
            self.push(p0 * (u * u * u) + c0 * (3.0 * u * u * t) + c1 * (3.0 * u * t * t) + p1 * (t * t * t));
        }
    }

    fn close(&mut self) {
        if self.current.len() > 1 && self.last != self.start {
            self.push(self.start);
        }
        self.finish_contour();
    }
}

/// `count` points spaced evenly by arc length along every contour.
///
/// Segments never bridge two contours. Outlines with no length fall back
/// to their vertices, repeated as needed.
fn resample(contours: &[Vec<Vec2>], count: usize) -> Vec<Vec2> {
    let segments: Vec<(Vec2, Vec2, f32)> = contours
        .iter()
        .flat_map(|c| c.windows(2).map(|w| (w[0], w[1], w[0].distance(w[1]))))
        .filter(|&(_, _, length)| length > 0.0)
        .collect();
    let total: f32 = segments.iter().map(|s| s.2).sum();

    if segments.is_empty() || !total.is_finite() {
        let vertices: Vec<Vec2> = contours.iter().flatten().copied().collect();
        if vertices.is_empty() {
            return vertices;
        }
        return (0..count).map(|i| vertices[i % vertices.len()]).collect();
    }

    let spacing = total / count as f32;
    let mut points = Vec::with_capacity(count);
    let mut segment = 0;
    let mut walked = 0.0;
    for i in 0..count {
        let distance = (i as f32 + 0.5) * spacing;
        while segment + 1 < segments.len() && walked + segments[segment].2 < distance {
            walked += segments[segment].2;
            segment += 1;
        }
        let (a, b, length) = segments[segment];
        let t = ((distance - walked) / length).clamp(0.0, 1.0);
        points.push(a.lerp(b, t));
    }
    points
}
