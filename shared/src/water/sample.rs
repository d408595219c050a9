//! Per-sample data shared between query consumers and the job graph.

use std::fmt;
use std::ops::Range;

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Identity of a query consumer in the sample registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryId(pub u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a water body. Zero is reserved for samples that no body claimed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WaterBodyId(pub u32);

impl WaterBodyId {
    pub const UNCLAIMED: WaterBodyId = WaterBodyId(0);

    #[inline]
    pub fn is_claimed(self) -> bool {
        self != Self::UNCLAIMED
    }
}

/// A point a consumer wants the water surface resolved at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterSample {
    /// World-space position written by the consumer
    pub position: Vec3,
    /// Owner of the slot
    pub query_id: QueryId,
    /// Body that claimed the sample this frame, written by classification
    pub water_body_id: WaterBodyId,
}

impl Default for WaterSample {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            query_id: QueryId(0),
            water_body_id: WaterBodyId::UNCLAIMED,
        }
    }
}

/// Resolved water surface for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterSurface {
    /// Surface point the sample resolves to
    pub position: Vec3,
    /// Unit surface normal
    pub normal: Vec3,
    /// Water column below the surface point
    pub depth: f32,
    /// Horizontal current (x, z)
    pub current: Vec2,
    /// Wave attenuation factor in [0, 1] produced by the depth modifier
    pub opacity: f32,
    pub water_body_id: WaterBodyId,
}

impl WaterSurface {
    /// Flat surface at `level` directly above or below `position`.
    pub fn flat(position: Vec3, level: f32, depth: f32, water_body_id: WaterBodyId) -> Self {
        Self {
            position: Vec3::new(position.x, level, position.z),
            normal: Vec3::Y,
            depth,
            current: Vec2::ZERO,
            opacity: 1.0,
            water_body_id,
        }
    }
}

impl Default for WaterSurface {
    fn default() -> Self {
        Self::flat(
            Vec3::ZERO,
            0.0,
            crate::DEFAULT_WATER_DEPTH,
            WaterBodyId::UNCLAIMED,
        )
    }
}

/// Exclusive index range `[start, end)` claimed by a query in the sample buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryRange {
    pub start: usize,
    pub end: usize,
}

impl QueryRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    #[inline]
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn overlaps(&self, other: &QueryRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Moves the range towards the front of the buffer by `amount` slots.
    pub fn shift_down(&mut self, amount: usize) {
        self.start -= amount;
        self.end -= amount;
    }
}

/// Lifecycle of the physics scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemState {
    #[default]
    None,
    Setup,
    Ready,
    Cleanup,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclaimed_body_id() {
        assert!(!WaterBodyId::UNCLAIMED.is_claimed());
        assert!(WaterBodyId(3).is_claimed());
        assert_eq!(WaterSample::default().water_body_id, WaterBodyId::UNCLAIMED);
    }

    #[test]
    fn test_query_range_shift_and_overlap() {
        let mut range = QueryRange::new(15, 5);
        assert_eq!(range.as_range(), 15..20);
        assert!(range.overlaps(&QueryRange::new(19, 2)));
        assert!(!range.overlaps(&QueryRange::new(10, 5)));

        range.shift_down(5);
        assert_eq!(range, QueryRange { start: 10, end: 15 });
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn test_flat_surface_keeps_horizontal_position() {
        let surface = WaterSurface::flat(Vec3::new(3.0, -7.0, 4.0), 1.5, 20.0, WaterBodyId(2));
        assert_eq!(surface.position, Vec3::new(3.0, 1.5, 4.0));
        assert_eq!(surface.normal, Vec3::Y);
        assert_eq!(surface.opacity, 1.0);
    }
}
