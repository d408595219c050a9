//! Depth lookup and shoreline opacity.
//!
//! Depth is signed: negative values are below the reference surface. A depth
//! profile maps the normalized depth inside `[-max_range, 0]` to an opacity
//! that scales wave displacement, so waves flatten out towards the shore.

use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::hash::ContentHasher;
use crate::OUT_OF_MAP_DEPTH;

/// Anything that can report signed water depth at a world position.
pub trait DepthSampler: Send + Sync {
    fn depth_at(&self, position: Vec3) -> f32;
}

impl<F> DepthSampler for F
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    fn depth_at(&self, position: Vec3) -> f32 {
        self(position)
    }
}

/// Piecewise-linear response curve over `[0, 1]`, clamped at its end keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthProfile {
    /// `(input, output)` keys sorted by input
    pub keys: Vec<Vec2>,
}

impl Default for DepthProfile {
    fn default() -> Self {
        Self::linear(Vec2::new(0.0, 1.0), Vec2::new(0.98, 0.0))
    }
}

impl DepthProfile {
    pub fn linear(start: Vec2, end: Vec2) -> Self {
        Self::from_keys(vec![start, end])
    }

    pub fn from_keys(mut keys: Vec<Vec2>) -> Self {
        keys.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { keys }
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 1.0,
        };
        if t <= first.x {
            return first.y;
        }
        if t >= last.x {
            return last.y;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.x {
                let span = b.x - a.x;
                if span <= f32::EPSILON {
                    return b.y;
                }
                return a.y + (b.y - a.y) * ((t - a.x) / span);
            }
        }
        last.y
    }

    pub(crate) fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_usize(self.keys.len());
        for key in &self.keys {
            hasher.write_vec2(*key);
        }
    }
}

/// Maps signed depth to wave opacity.
///
/// `1 - saturate(-depth / max_range)` is fed through the profile, saturated, then
/// raised to `gamma` so the falloff reaches full opacity sooner.
pub fn depth_opacity(depth: f32, max_range: f32, profile: &DepthProfile, gamma: f32) -> f32 {
    let normalized = 1.0 - (-depth / max_range).clamp(0.0, 1.0);
    let opacity = profile.evaluate(normalized).clamp(0.0, 1.0);
    opacity.powf(gamma).clamp(0.0, 1.0)
}

/// Square height map baked over a horizontal area centered on `origin`.
///
/// Texels hold normalized terrain height; `1.0` sits at `offset` above the
/// reference surface and `0.0` sits `range` below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthMap {
    pub origin: Vec3,
    /// World extent covered by the map along x and z
    pub size: f32,
    pub range: f32,
    pub offset: f32,
    pub resolution: usize,
    /// Row-major by z then x, `resolution * resolution` values
    pub values: Vec<f32>,
}

impl DepthMap {
    pub fn new(origin: Vec3, size: f32, range: f32, offset: f32, resolution: usize) -> Self {
        Self {
            origin,
            size,
            range,
            offset,
            resolution,
            values: vec![0.0; resolution * resolution],
        }
    }

    /// Texel coordinates for a world position, `None` outside the map.
    fn texel(&self, position: Vec3) -> Option<usize> {
        if self.resolution == 0 || self.size <= 0.0 {
            return None;
        }
        let uv = (position - self.origin) / self.size + Vec3::splat(0.5);
        let (u, v) = (uv.z, uv.x);
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }

        let last = self.resolution - 1;
        let row = ((u * self.resolution as f32) as usize).min(last);
        let column = ((v * self.resolution as f32) as usize).min(last);
        Some(row * self.resolution + column)
    }

    pub fn set(&mut self, row: usize, column: usize, value: f32) {
        if let Some(texel) = self.values.get_mut(row * self.resolution + column) {
            *texel = value;
        }
    }

    pub fn sample(&self, position: Vec3) -> f32 {
        match self.texel(position).and_then(|index| self.values.get(index)) {
            Some(value) => -(1.0 - value) * (self.range + self.offset) + self.offset,
            None => OUT_OF_MAP_DEPTH,
        }
    }
}

impl DepthSampler for DepthMap {
    fn depth_at(&self, position: Vec3) -> f32 {
        self.sample(position)
    }
}

/// Where the depth modifier reads depth from.
#[derive(Clone, Serialize, Deserialize)]
pub enum DepthSource {
    /// Same signed depth everywhere
    Constant(f32),
    Map(DepthMap),
    /// Runtime callback, not serialized
    #[serde(skip)]
    Custom(Arc<dyn DepthSampler>),
}

impl Default for DepthSource {
    fn default() -> Self {
        DepthSource::Constant(-crate::DEFAULT_WATER_DEPTH)
    }
}

impl fmt::Debug for DepthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthSource::Constant(depth) => f.debug_tuple("Constant").field(depth).finish(),
            DepthSource::Map(map) => f
                .debug_struct("Map")
                .field("origin", &map.origin)
                .field("size", &map.size)
                .field("resolution", &map.resolution)
                .finish(),
            DepthSource::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl DepthSampler for DepthSource {
    fn depth_at(&self, position: Vec3) -> f32 {
        match self {
            DepthSource::Constant(depth) => *depth,
            DepthSource::Map(map) => map.sample(position),
            DepthSource::Custom(sampler) => sampler.depth_at(position),
        }
    }
}

impl DepthSource {
    pub(crate) fn hash_content(&self, hasher: &mut ContentHasher) {
        match self {
            DepthSource::Constant(depth) => {
                hasher.write_u8(0);
                hasher.write_f32(*depth);
            }
            DepthSource::Map(map) => {
                hasher.write_u8(1);
                hasher.write_vec3(map.origin);
                hasher.write_f32(map.size);
                hasher.write_f32(map.range);
                hasher.write_f32(map.offset);
                hasher.write_usize(map.resolution);
                for value in &map.values {
                    hasher.write_f32(*value);
                }
            }
            DepthSource::Custom(sampler) => {
                hasher.write_u8(2);
                hasher.write_usize(Arc::as_ptr(sampler) as *const () as usize);
            }
        }
    }
}
