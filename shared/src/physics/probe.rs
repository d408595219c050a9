use bevy::math::{UVec2, Vec3};
use bevy::prelude::{Component, Transform};

use crate::water::{QueryId, WaterQuery, WaterSample, WaterSurface};

/// Grid of samples centered on a transform, used to inspect the resolved surface.
#[derive(Component, Debug, Clone)]
pub struct DebugWaterProbe {
    pub id: QueryId,
    pub transform: Transform,
    dimensions: UVec2,
    spacing: f32,
    /// Local grid positions, x-major
    local_points: Vec<Vec3>,
    results: Vec<WaterSurface>,
}

/// Summary of the latest probe results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeStats {
    pub min_height: f32,
    pub max_height: f32,
    pub mean_height: f32,
    /// Samples that landed inside a water body
    pub claimed: usize,
}

impl DebugWaterProbe {
    pub fn new(id: QueryId, transform: Transform, dimensions: UVec2, spacing: f32) -> Self {
        let mut probe = Self {
            id,
            transform,
            dimensions,
            spacing,
            local_points: Vec::new(),
            results: Vec::new(),
        };
        probe.rebuild_grid();
        probe
    }

    pub fn set_grid(&mut self, dimensions: UVec2, spacing: f32) {
        self.dimensions = dimensions;
        self.spacing = spacing;
        self.rebuild_grid();
    }

    fn rebuild_grid(&mut self) {
        let half = (self.dimensions.as_vec2() / 2.0 - 0.5) * self.spacing;
        let (width, length) = (self.dimensions.x as usize, self.dimensions.y as usize);

        self.local_points = vec![Vec3::ZERO; width * length];
        for x in 0..width {
            for z in 0..length {
                self.local_points[x + z * width] = Vec3::new(
                    x as f32 * self.spacing - half.x,
                    0.0,
                    z as f32 * self.spacing - half.y,
                );
            }
        }
        self.results.clear();
    }

    pub fn results(&self) -> &[WaterSurface] {
        &self.results
    }

    pub fn stats(&self) -> Option<ProbeStats> {
        if self.results.is_empty() {
            return None;
        }

        let mut min_height = f32::MAX;
        let mut max_height = f32::MIN;
        let mut sum = 0.0;
        for surface in &self.results {
            min_height = min_height.min(surface.position.y);
            max_height = max_height.max(surface.position.y);
            sum += surface.position.y;
        }

        Some(ProbeStats {
            min_height,
            max_height,
            mean_height: sum / self.results.len() as f32,
            claimed: self
                .results
                .iter()
                .filter(|surface| surface.water_body_id.is_claimed())
                .count(),
        })
    }
}

impl WaterQuery for DebugWaterProbe {
    fn query_id(&self) -> QueryId {
        self.id
    }

    fn query_count(&self) -> usize {
        self.local_points.len()
    }

    fn set_query_positions(&mut self, samples: &mut [WaterSample]) {
        for (sample, point) in samples.iter_mut().zip(&self.local_points) {
            sample.position = self.transform.transform_point(*point);
        }
    }

    fn get_query_results(&mut self, surfaces: &[WaterSurface]) {
        self.results.clear();
        self.results.extend_from_slice(surfaces);
    }
}
