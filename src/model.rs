//! Replacing the procedural silhouette with external geometry.
//!
//! A [`VertexSource`] produces a [`VertexCloud`] (3D points). [`sample`]
//! projects it to 2D and resamples it to the swarm's particle count, and
//! [`pad_or_truncate`] fits already-2D home arrays to the count. Both keep
//! the particle count fixed; only `home` changes.
//!
//! ```ignore
//! let source = ObjVertexSource::new("assets/models");
//! let cloud = source.fetch("fnlloyd.obj")?;
//! let homes = sample(&cloud, 12_000, 120.0, 120.0, &mut rng)?;
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use glam::{Vec2, Vec3};
use rand::Rng;

use crate::error::ModelError;

/// Jitter (in normalized units) given to oversampled vertices.
const WRAP_JITTER: f32 = 0.02;

/// Jitter (in normalized units) given to padded home positions around the
/// centroid. Scaled by the model scale, so `± 0.05 * scale` pixels.
const PAD_JITTER: f32 = 0.1;

/// Axis-aligned bounds of a vertex cloud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn of(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Bounds { min: first, max: first }, |b, &p| Bounds {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A set of 3D vertex positions with precomputed bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexCloud {
    positions: Vec<Vec3>,
    bounds: Bounds,
}

impl VertexCloud {
    /// Build a cloud, computing bounds. Fails on an empty point set or on
    /// any NaN or infinite coordinate.
    pub fn new(positions: Vec<Vec3>) -> Result<Self, ModelError> {
        let bounds = Bounds::of(&positions).ok_or(ModelError::Empty)?;
        if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite { index });
        }
        Ok(Self { positions, bounds })
    }

    /// Build a cloud from interleaved `[x, y, z, x, y, z, ...]` floats.
    /// A trailing partial triple is ignored.
    pub fn from_interleaved(data: &[f32]) -> Result<Self, ModelError> {
        Self::new(data.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])).collect())
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Home positions for every particle, split by axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HomePositions {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

impl HomePositions {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, p: Vec2) {
        self.x.push(p.x);
        self.y.push(p.y);
    }

    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Vec2 {
        Vec2::new(self.x[i], self.y[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.x.iter().zip(&self.y).map(|(&x, &y)| Vec2::new(x, y))
    }
}

/// Sample `target_count` 2D home positions from a vertex cloud.
///
/// X is kept and Y is flipped (3D Y-up to canvas Y-down). Coordinates are
/// centered on the bounds midpoint and divided by the bounds height, then
/// scaled by `(scale_x, scale_y)`. Oversampling wraps indices and jitters
/// the repeats; undersampling takes a uniform stride.
pub fn sample<R: Rng + ?Sized>(
    cloud: &VertexCloud,
    target_count: usize,
    scale_x: f32,
    scale_y: f32,
    rng: &mut R,
) -> Result<HomePositions, ModelError> {
    let n = cloud.len();
    if n == 0 {
        return Err(ModelError::Empty);
    }

    let center = cloud.bounds.center();
    let height = cloud.bounds.size().y;
    let norm = if height > 0.0 { 1.0 / height } else { 1.0 };

    let mut homes = HomePositions::with_capacity(target_count);
    for i in 0..target_count {
        let index = if target_count > n {
            i % n
        } else {
            (i as u64 * n as u64 / target_count as u64) as usize
        };
        let v = cloud.positions[index];
        let nx = (v.x - center.x) * norm;
        let ny = -(v.y - center.y) * norm;

        let jitter = if i >= n {
            (rng.gen::<f32>() - 0.5) * WRAP_JITTER
        } else {
            0.0
        };
        homes.push(Vec2::new((nx + jitter) * scale_x, (ny + jitter) * scale_y));
    }
    Ok(homes)
}

/// Fit home arrays to exactly `target_count` entries.
///
/// Short input is padded with points jittered around its centroid by up to
/// `0.05 * scale`; long input is resampled by nearest index. Empty input
/// yields points at the origin. Mismatched `x`/`y` lengths use the shorter
/// one. Pairs with a NaN or infinite coordinate are dropped first.
pub fn pad_or_truncate<R: Rng + ?Sized>(
    home_x: &[f32],
    home_y: &[f32],
    target_count: usize,
    scale: Vec2,
    rng: &mut R,
) -> HomePositions {
    let finite: Vec<Vec2> = home_x
        .iter()
        .zip(home_y)
        .map(|(&x, &y)| Vec2::new(x, y))
        .filter(|p| p.is_finite())
        .collect();
    let n = finite.len();
    let mut out = HomePositions::with_capacity(target_count);

    if n == 0 {
        out.x.resize(target_count, 0.0);
        out.y.resize(target_count, 0.0);
        return out;
    }

    if n >= target_count {
        for i in 0..target_count {
            let src = (i as u64 * n as u64 / target_count as u64) as usize;
            out.push(finite[src]);
        }
        return out;
    }

    let centroid = finite.iter().sum::<Vec2>() / n as f32;

    for &p in &finite {
        out.push(p);
    }
    for _ in n..target_count {
        let jitter = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * PAD_JITTER * scale;
        out.push(centroid + jitter);
    }
    out
}

/// Anything that can produce a vertex cloud for a model URL or path.
///
/// Implementations may block; the swarm calls them from a loader thread.
pub trait VertexSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<VertexCloud, ModelError>;
}

/// Reads the `v x y z` lines of Wavefront OBJ files under a root directory.
#[derive(Clone, Debug)]
pub struct ObjVertexSource {
    root: PathBuf,
}

impl ObjVertexSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse OBJ text. Everything except vertex lines is ignored.
    pub fn parse(text: &str) -> Result<VertexCloud, ModelError> {
        let mut positions = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            if parts.next() != Some("v") {
                continue;
            }
            let coords: Vec<f32> = parts
                .take(3)
                .map(|s| s.parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|e| ModelError::Parse {
                    line: i + 1,
                    message: e.to_string(),
                })?;
            if coords.len() != 3 {
                return Err(ModelError::Parse {
                    line: i + 1,
                    message: format!("expected 3 coordinates, found {}", coords.len()),
                });
            }
            let v = Vec3::new(coords[0], coords[1], coords[2]);
            if !v.is_finite() {
                return Err(ModelError::Parse {
                    line: i + 1,
                    message: "non-finite coordinate".to_string(),
                });
            }
            positions.push(v);
        }
        VertexCloud::new(positions)
    }
}

impl VertexSource for ObjVertexSource {
    fn fetch(&self, url: &str) -> Result<VertexCloud, ModelError> {
        let path = self.root.join(url);
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&text)
    }
}

/// In-memory clouds keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryVertexSource {
    clouds: HashMap<String, VertexCloud>,
}

impl MemoryVertexSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cloud(mut self, name: impl Into<String>, cloud: VertexCloud) -> Self {
        self.clouds.insert(name.into(), cloud);
        self
    }
}

impl VertexSource for MemoryVertexSource {
    fn fetch(&self, url: &str) -> Result<VertexCloud, ModelError> {
        self.clouds
            .get(url)
            .cloned()
            .ok_or_else(|| ModelError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square() -> VertexCloud {
        // 2 wide, 4 tall, centered at (1, 2, 0)
        VertexCloud::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_bounds() {
        let cloud = square();
        assert_eq!(cloud.bounds().min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(cloud.bounds().max, Vec3::new(2.0, 4.0, 1.0));
        assert_eq!(cloud.bounds().center(), Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_empty_cloud_is_rejected() {
        assert!(matches!(VertexCloud::new(vec![]), Err(ModelError::Empty)));
        assert!(matches!(VertexCloud::from_interleaved(&[1.0, 2.0]), Err(ModelError::Empty)));
    }

    #[test]
    fn test_sample_normalizes_centers_and_flips() {
        let mut rng = StdRng::seed_from_u64(0);
        let homes = sample(&square(), 4, 100.0, 100.0, &mut rng).unwrap();
        assert_eq!(homes.len(), 4);
        // (0,0) -> ((0-1)/4, -(0-2)/4) * 100 = (-25, 50)
        assert_eq!(homes.get(0), Vec2::new(-25.0, 50.0));
        // (2,4) -> (25, -50)
        assert_eq!(homes.get(2), Vec2::new(25.0, -50.0));
    }

    #[test]
    fn test_sample_subsamples_with_uniform_stride() {
        let points: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32, i as f32, 0.0)).collect();
        let cloud = VertexCloud::new(points).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let homes = sample(&cloud, 5, 9.0, 9.0, &mut rng).unwrap();
        // Stride 2: vertices 0, 2, 4, 6, 8; normalized x = (i - 4.5) / 9 * 9
        let expected = [-4.5, -2.5, -0.5, 1.5, 3.5];
        assert_eq!(homes.len(), expected.len());
        for (x, e) in homes.x.iter().zip(expected) {
            assert!((x - e).abs() < 1e-4, "{} vs {}", x, e);
        }
    }

    #[test]
    fn test_sample_oversamples_with_wrap_and_jitter() {
        let cloud = square();
        let mut rng = StdRng::seed_from_u64(5);
        let homes = sample(&cloud, 10, 100.0, 100.0, &mut rng).unwrap();
        assert_eq!(homes.len(), 10);

        // First pass is exact
        let exact = sample(&cloud, 4, 100.0, 100.0, &mut rng).unwrap();
        for i in 0..4 {
            assert_eq!(homes.get(i), exact.get(i));
        }
        // Repeats stay within jitter of their source vertex
        for i in 4..10 {
            let d = homes.get(i) - exact.get(i % 4);
            assert!(d.x.abs() <= WRAP_JITTER * 0.5 * 100.0 + 1e-4);
            assert!(d.y.abs() <= WRAP_JITTER * 0.5 * 100.0 + 1e-4);
        }
    }

    #[test]
    fn test_flat_cloud_does_not_divide_by_zero() {
        let cloud = VertexCloud::new(vec![Vec3::new(-1.0, 3.0, 0.0), Vec3::new(1.0, 3.0, 0.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let homes = sample(&cloud, 2, 10.0, 10.0, &mut rng).unwrap();
        assert_eq!(homes.get(0), Vec2::new(-10.0, 0.0));
        assert!(homes.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_pad_or_truncate_keeps_count() {
        let mut rng = StdRng::seed_from_u64(2);
        let xs = [0.0, 10.0, 20.0, 30.0];
        let ys = [0.0, 0.0, 10.0, 10.0];

        let scale = Vec2::splat(120.0);

        let same = pad_or_truncate(&xs, &ys, 4, scale, &mut rng);
        assert_eq!(same.x, xs.to_vec());

        let truncated = pad_or_truncate(&xs, &ys, 2, scale, &mut rng);
        assert_eq!(truncated.x, vec![0.0, 20.0]);
        assert_eq!(truncated.y, vec![0.0, 10.0]);

        let padded = pad_or_truncate(&xs, &ys, 9, scale, &mut rng);
        assert_eq!(padded.len(), 9);
        let centroid = Vec2::new(15.0, 5.0);
        // 0.05 * 120 = 6 px either side
        for p in padded.iter().skip(4) {
            assert!((p - centroid).abs().max_element() <= 6.0 + 1e-4);
        }

        let empty = pad_or_truncate(&[], &[], 3, scale, &mut rng);
        assert_eq!(empty.x, vec![0.0; 3]);
    }

    #[test]
    fn test_pad_or_truncate_uses_shorter_axis() {
        let mut rng = StdRng::seed_from_u64(2);
        let homes = pad_or_truncate(&[1.0, 2.0, 3.0], &[4.0], 1, Vec2::ONE, &mut rng);
        assert_eq!(homes.get(0), Vec2::new(1.0, 4.0));
    }

    #[test]
    fn test_pad_or_truncate_drops_non_finite_pairs() {
        let mut rng = StdRng::seed_from_u64(4);
        let xs = [f32::NAN, 10.0, 20.0, f32::INFINITY];
        let ys = [0.0, 2.0, 4.0, 1.0];
        let homes = pad_or_truncate(&xs, &ys, 6, Vec2::splat(120.0), &mut rng);

        assert_eq!(homes.len(), 6);
        assert!(homes.iter().all(|p| p.is_finite()));
        assert_eq!(homes.get(0), Vec2::new(10.0, 2.0));
        assert_eq!(homes.get(1), Vec2::new(20.0, 4.0));
        // Padding centers on the finite points only
        for p in homes.iter().skip(2) {
            assert!((p - Vec2::new(15.0, 3.0)).abs().max_element() <= 6.0 + 1e-4);
        }

        let all_bad = pad_or_truncate(&[f32::NAN], &[1.0], 2, Vec2::ONE, &mut rng);
        assert_eq!(all_bad.x, vec![0.0; 2]);
    }

    #[test]
    fn test_non_finite_vertices_are_rejected() {
        let err = VertexCloud::new(vec![Vec3::ZERO, Vec3::new(1.0, f32::NAN, 0.0)]).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite { index: 1 }));
        let err = VertexCloud::from_interleaved(&[0.0, 0.0, f32::INFINITY]).unwrap_err();
        assert!(matches!(err, ModelError::NonFinite { index: 0 }));

        let err = ObjVertexSource::parse("v 0 0 0\nv nan 0 0\nv 1 1 0\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 2, .. }));
        let err = ObjVertexSource::parse("v inf 0 0\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_obj() {
        let text = "# comment\nv 0 0 0\nvn 0 1 0\nv 1.5 -2 3\nf 1 2 3\n";
        let cloud = ObjVertexSource::parse(text).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.positions()[1], Vec3::new(1.5, -2.0, 3.0));

        let err = ObjVertexSource::parse("v 1 2\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 1, .. }));
        let err = ObjVertexSource::parse("v 1 x 2\n").unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 1, .. }));
        assert!(matches!(ObjVertexSource::parse("f 1 2 3\n"), Err(ModelError::Empty)));
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryVertexSource::new().with_cloud("square", square());
        assert_eq!(source.fetch("square").unwrap().len(), 4);
        assert!(matches!(source.fetch("circle"), Err(ModelError::NotFound(_))));
    }
}
