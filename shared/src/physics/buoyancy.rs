//! Buoyancy forces from resolved water surfaces.
//!
//! Each voxel of a floating body is treated as a small sphere. Its submerged
//! fraction scales an even share of the body's Archimedes force, and a damping
//! term opposes the voxel's velocity. Torque is accumulated about the center of
//! mass.

use bevy::math::Vec3;

use super::rigid::RigidBodyState;
use crate::water::WaterSurface;
use crate::GRAVITY;

/// Constants for buoyancy
pub mod constants {
    /// Density of water (kg/m³)
    pub const WATER_DENSITY: f32 = 1000.0;
    /// Velocity damping per voxel, scaled by mass
    pub const DAMPENER: f32 = 0.0025;
    /// Radius of the sphere standing in for a voxel, relative to voxel spacing
    pub const VOXEL_SPHERE_RATIO: f32 = 0.63;
    /// Linear drag multiplier reached when fully submerged
    pub const SUBMERGED_LINEAR_DRAG: f32 = 10.0;
    /// Angular drag multiplier reached when fully submerged
    pub const SUBMERGED_ANGULAR_DRAG: f32 = 4.0;
}

use constants::*;

/// Net buoyancy acting on a body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhysicsForce {
    pub force: Vec3,
    pub torque: Vec3,
    /// Submerged fraction of the body in [0, 1]
    pub submerged: f32,
}

/// Volume of `voxel_count` cubes of side `spacing`.
pub fn volume_from_voxels(voxel_count: usize, spacing: f32) -> f32 {
    spacing.powi(3) * voxel_count as f32
}

/// Upward force carried by each voxel when fully submerged.
pub fn local_archimedes_force(voxel_count: usize, volume: f32) -> Vec3 {
    if voxel_count == 0 {
        return Vec3::ZERO;
    }
    let magnitude = WATER_DENSITY * GRAVITY.abs() * volume;
    Vec3::new(0.0, magnitude, 0.0) / voxel_count as f32
}

#[inline]
fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Force on one voxel and its submerged fraction, `None` when it is dry.
pub fn voxel_force(
    position: Vec3,
    velocity: Vec3,
    surface: &WaterSurface,
    spacing: f32,
    mass: f32,
    archimedes: Vec3,
) -> Option<(Vec3, f32)> {
    let radius = spacing * VOXEL_SPHERE_RATIO;
    let depth = surface.position.y - (position.y - radius);
    if depth.is_nan() || depth <= 0.0 {
        return None;
    }

    let k = inverse_lerp(0.0, radius * 2.0, depth);
    let damping = DAMPENER * mass * -velocity;
    Some((damping + k.sqrt() * archimedes, k))
}

/// Sums the voxel forces of a body.
///
/// `points` are world-space voxel centers and `surfaces` the matching query
/// results; extra entries on either side are ignored.
pub fn buoyancy_force(
    points: &[Vec3],
    surfaces: &[WaterSurface],
    spacing: f32,
    body: &RigidBodyState,
    world_center_of_mass: Vec3,
    archimedes: Vec3,
) -> PhysicsForce {
    let mut total = PhysicsForce::default();
    let count = points.len().max(1) as f32;

    for (point, surface) in points.iter().zip(surfaces) {
        let velocity = body.point_velocity(*point, world_center_of_mass);
        let voxel = voxel_force(*point, velocity, surface, spacing, body.mass, archimedes);
        if let Some((force, k)) = voxel {
            total.submerged += k / count;
            total.force += force;
            total.torque += (*point - world_center_of_mass).cross(force);
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::WaterBodyId;

    fn surface_at(level: f32) -> WaterSurface {
        WaterSurface::flat(Vec3::ZERO, level, 20.0, WaterBodyId(1))
    }

    #[test]
    fn test_volume_and_archimedes() {
        let volume = volume_from_voxels(8, 0.5);
        assert!((volume - 1.0).abs() < 1e-6);

        let force = local_archimedes_force(8, volume);
        assert!((force.y * 8.0 - WATER_DENSITY * GRAVITY).abs() < 1e-2);
        assert_eq!(local_archimedes_force(0, volume), Vec3::ZERO);
    }

    #[test]
    fn test_dry_voxel_has_no_force() {
        let archimedes = Vec3::Y * 100.0;
        let above = Vec3::new(0.0, 5.0, 0.0);
        assert!(voxel_force(above, Vec3::ZERO, &surface_at(0.0), 1.0, 1.0, archimedes).is_none());
    }

    #[test]
    fn test_submersion_scales_lift() {
        let archimedes = Vec3::Y * 100.0;
        let radius = VOXEL_SPHERE_RATIO;

        // Sphere center on the surface
        let (half, k) =
            voxel_force(Vec3::ZERO, Vec3::ZERO, &surface_at(0.0), 1.0, 1.0, archimedes).unwrap();
        assert!((k - 0.5).abs() < 1e-5);
        assert!((half.y - 0.5f32.sqrt() * 100.0).abs() < 1e-3);

        let (full, k) = voxel_force(
            Vec3::new(0.0, -3.0 * radius, 0.0),
            Vec3::ZERO,
            &surface_at(0.0),
            1.0,
            1.0,
            archimedes,
        )
        .unwrap();
        assert_eq!(k, 1.0);
        assert!((full.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_damping_opposes_velocity() {
        let (force, _) = voxel_force(
            Vec3::new(0.0, -2.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            &surface_at(0.0),
            1.0,
            10.0,
            Vec3::ZERO,
        )
        .unwrap();
        assert!((force.x + DAMPENER * 10.0 * 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_uneven_lift_produces_torque() {
        let body = RigidBodyState::new(1.0);
        let points = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        // Only the +x voxel is in water
        let surfaces = [surface_at(-5.0), surface_at(0.0)];
        let total = buoyancy_force(&points, &surfaces, 1.0, &body, Vec3::ZERO, Vec3::Y * 10.0);

        assert!(total.force.y > 0.0);
        assert!(total.torque.z > 0.0);
        assert!((total.submerged - 0.25).abs() < 1e-5);
    }
}
