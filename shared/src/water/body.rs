//! Water bodies and their per-frame bounds.

use std::ops::Range;

use bevy::math::{bounding::Aabb3d, Mat4, Vec2, Vec3, Vec3A};
use bevy::prelude::{Component, Transform};
use serde::{Deserialize, Serialize};

use super::config::{DepthSettings, FlowSettings, WaveSettings};
use super::sample::WaterBodyId;

pub mod constants {
    /// Default horizontal extent of a water body
    pub const DEFAULT_BODY_SIZE: f32 = 250.0;
    /// Default height above the surface that still counts as inside the body
    pub const DEFAULT_RANGE_ABOVE: f32 = 4.0;
    /// Default depth below the surface that still counts as inside the body
    pub const DEFAULT_RANGE_BELOW: f32 = 10.0;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Unbounded horizontally
    #[default]
    Infinite,
    Plane,
    Circle,
}

/// Volume of a water body in its local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterShape {
    pub kind: ShapeKind,
    /// Horizontal extent (x, z). Circles use `x` as the diameter
    pub size: Vec2,
    /// Vertical extent as (above, below) the surface
    pub range: Vec2,
}

impl Default for WaterShape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Infinite,
            size: Vec2::splat(constants::DEFAULT_BODY_SIZE),
            range: Vec2::new(constants::DEFAULT_RANGE_ABOVE, constants::DEFAULT_RANGE_BELOW),
        }
    }
}

impl WaterShape {
    pub fn plane(size: Vec2) -> Self {
        Self {
            kind: ShapeKind::Plane,
            size,
            ..Default::default()
        }
    }

    pub fn circle(diameter: f32) -> Self {
        Self {
            kind: ShapeKind::Circle,
            size: Vec2::splat(diameter),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, above: f32, below: f32) -> Self {
        self.range = Vec2::new(above, below);
        self
    }

    /// Local-space bounding box, the surface sits at local y = 0.
    pub fn local_bounds(&self) -> Aabb3d {
        let total = self.range.x + self.range.y;
        let center = Vec3::new(0.0, self.range.x - total * 0.5, 0.0);
        let (width, length) = match self.kind {
            ShapeKind::Infinite => (f32::INFINITY, f32::INFINITY),
            ShapeKind::Plane => (self.size.x, self.size.y),
            ShapeKind::Circle => (self.size.x, self.size.x),
        };
        Aabb3d::new(center, Vec3::new(width, total, length) * 0.5)
    }
}

/// Modifier data attached to a water body, keyed by modifier kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierSettings {
    pub waves: Option<WaveSettings>,
    pub depth: Option<DepthSettings>,
    pub flow: Option<FlowSettings>,
}

impl Default for ModifierSettings {
    fn default() -> Self {
        Self {
            waves: Some(WaveSettings::default()),
            depth: None,
            flow: None,
        }
    }
}

/// A region of water with its own shape and modifiers.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterBody {
    pub id: WaterBodyId,
    pub shape: WaterShape,
    pub transform: Transform,
    pub enabled: bool,
    pub modifiers: ModifierSettings,
}

impl Default for WaterBody {
    fn default() -> Self {
        Self {
            id: WaterBodyId(1),
            shape: WaterShape::default(),
            transform: Transform::IDENTITY,
            enabled: true,
            modifiers: ModifierSettings::default(),
        }
    }
}

impl WaterBody {
    pub fn new(id: WaterBodyId, shape: WaterShape) -> Self {
        Self {
            id,
            shape,
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_waves(mut self, waves: Option<WaveSettings>) -> Self {
        self.modifiers.waves = waves;
        self
    }

    pub fn with_depth(mut self, depth: Option<DepthSettings>) -> Self {
        self.modifiers.depth = depth;
        self
    }

    pub fn with_flow(mut self, flow: Option<FlowSettings>) -> Self {
        self.modifiers.flow = flow;
        self
    }
}

/// Snapshot of a water body used by the job graph for one frame.
#[derive(Debug, Clone)]
pub struct WaterBodyData {
    pub id: WaterBodyId,
    pub bounds: Aabb3d,
    pub world_matrix: Mat4,
    pub world_to_local: Mat4,
    pub enabled: bool,
    /// Sample index window `[min, max + 1)` claimed by this body, filled by the lookup job
    pub offset: Range<usize>,
}

impl WaterBodyData {
    pub fn from_body(body: &WaterBody) -> Self {
        let world_matrix = body.transform.compute_matrix();
        Self {
            id: body.id,
            bounds: body.shape.local_bounds(),
            world_matrix,
            world_to_local: world_matrix.inverse(),
            enabled: body.enabled,
            offset: 0..0,
        }
    }

    /// Height of the undisturbed surface.
    #[inline]
    pub fn level(&self) -> f32 {
        self.world_matrix.w_axis.y
    }

    /// Whether a world-space point lies inside the body's oriented box.
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        let local = Vec3A::from(self.world_to_local.transform_point3(point));
        local.cmpge(self.bounds.min).all() && local.cmple(self.bounds.max).all()
    }
}
