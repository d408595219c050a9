use bevy::math::{Quat, Vec3};
use bevy::prelude::{Component, Transform};

use crate::water::{QueryId, WaterQuery, WaterSample, WaterSurface};

/// Single-sample float that snaps to the water height and leans into the surface normal.
#[derive(Component, Debug, Clone)]
pub struct SimpleBuoyantObject {
    pub id: QueryId,
    pub transform: Transform,
    /// Sample point relative to the translation
    pub sample_offset: Vec3,
    surface: Option<WaterSurface>,
}

impl SimpleBuoyantObject {
    pub fn new(id: QueryId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            sample_offset: Vec3::ZERO,
            surface: None,
        }
    }

    pub fn with_sample_offset(mut self, offset: Vec3) -> Self {
        self.sample_offset = offset;
        self
    }

    pub fn surface(&self) -> Option<&WaterSurface> {
        self.surface.as_ref()
    }

    /// Moves onto the last sampled surface and turns up towards its normal by `dt`.
    pub fn follow_surface(&mut self, dt: f32) {
        let Some(surface) = self.surface else {
            return;
        };

        self.transform.translation.y = surface.position.y;

        let up = self.transform.rotation * Vec3::Y;
        let towards_normal = Quat::from_rotation_arc(up, surface.normal.normalize_or(Vec3::Y));
        let partial = Quat::IDENTITY.slerp(towards_normal, dt.clamp(0.0, 1.0));
        self.transform.rotation = (partial * self.transform.rotation).normalize();
    }
}

impl WaterQuery for SimpleBuoyantObject {
    fn query_id(&self) -> QueryId {
        self.id
    }

    fn query_count(&self) -> usize {
        1
    }

    fn set_query_positions(&mut self, samples: &mut [WaterSample]) {
        if let Some(sample) = samples.first_mut() {
            sample.position = self.transform.translation + self.sample_offset;
        }
    }

    fn get_query_results(&mut self, surfaces: &[WaterSurface]) {
        self.surface = surfaces.first().copied();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::WaterBodyId;

    #[test]
    fn test_sample_uses_offset() {
        let mut float = SimpleBuoyantObject::new(QueryId(1), Transform::from_xyz(1.0, 2.0, 3.0))
            .with_sample_offset(Vec3::new(0.0, -1.0, 0.0));
        let mut samples = [WaterSample::default()];
        float.set_query_positions(&mut samples);
        assert_eq!(samples[0].position, Vec3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn test_follow_surface() {
        let mut float = SimpleBuoyantObject::new(QueryId(1), Transform::from_xyz(0.0, 5.0, 0.0));
        // Nothing sampled yet
        float.follow_surface(0.5);
        assert_eq!(float.transform.translation.y, 5.0);

        let mut surface = WaterSurface::flat(Vec3::ZERO, 1.25, 20.0, WaterBodyId(1));
        surface.normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        float.get_query_results(&[surface]);

        float.follow_surface(1.0);
        assert_eq!(float.transform.translation.y, 1.25);
        let up = float.transform.rotation * Vec3::Y;
        assert!((up - surface.normal).length() < 1e-4);
    }

    #[test]
    fn test_partial_tilt() {
        let mut float = SimpleBuoyantObject::new(QueryId(1), Transform::IDENTITY);
        let mut surface = WaterSurface::default();
        surface.normal = Vec3::X;
        float.get_query_results(&[surface]);

        float.follow_surface(0.5);
        let up = float.transform.rotation * Vec3::Y;
        assert!((up.angle_between(Vec3::Y) - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    }
}
