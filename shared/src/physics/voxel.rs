//! Voxelized buoyant rigid body.
//!
//! The body's box is sliced into a grid of voxels once. Each voxel samples the
//! water every frame and contributes a share of the Archimedes force, so
//! partially submerged or tilted bodies pick up torque naturally. The summed
//! force is handed to rapier, which integrates the body.

use bevy::math::Vec3;
use bevy::prelude::{Component, Transform};
use bevy_log::debug;
use bevy_rapier3d::prelude::{Damping, ExternalForce, Velocity};

use super::buoyancy::{
    buoyancy_force, constants::*, local_archimedes_force, volume_from_voxels, PhysicsForce,
};
use super::rigid::RigidBodyState;
use crate::error::WaterError;
use crate::water::{QueryId, WaterQuery, WaterSample, WaterSurface};

/// Upper bound on the voxel grid of a single body
pub const MAX_VOXELS: usize = 4096;

/// Slices a box centered on the local origin into voxel centers.
///
/// The grid covers the box diagonal and is quantized to the spacing; it starts
/// on a half-spacing offset when that fits the diagonal more tightly. Returns the
/// voxels and the spacing actually used, which shrinks for boxes smaller than it.
pub fn voxelize_box(half_extents: Vec3, spacing: f32) -> Result<(Vec<Vec3>, f32), WaterError> {
    if spacing.is_nan() || spacing <= 0.0 {
        return Err(WaterError::InvalidSettings(format!(
            "voxel spacing must be positive, got {}",
            spacing
        )));
    }

    let half_extents = half_extents.abs();
    let bound_size = (half_extents * 2.0).length();
    let mut spacing = spacing;
    if bound_size > 0.0 && bound_size < spacing {
        spacing = bound_size;
    }

    let half_spacing = spacing * 0.5;
    let start = if bound_size % half_spacing < bound_size % spacing {
        half_spacing
    } else {
        0.0
    };
    let cells = (bound_size / spacing).ceil();
    if cells.powi(3) > MAX_VOXELS as f32 {
        return Err(WaterError::InvalidSettings(format!(
            "{} voxels exceed the limit of {}, increase the voxel spacing",
            cells.powi(3),
            MAX_VOXELS
        )));
    }

    let quantized = cells * spacing;
    let steps = ((quantized - start) / spacing).ceil().max(0.0) as usize;
    let tolerance = spacing * 1.0e-3;
    let mut voxels = Vec::new();
    for x in 0..steps {
        for y in 0..steps {
            for z in 0..steps {
                let grid = Vec3::new(x as f32, y as f32, z as f32) * spacing + Vec3::splat(start);
                let position = grid - Vec3::splat(quantized * 0.5);
                if position.abs().cmple(half_extents + tolerance).all() {
                    voxels.push(position);
                }
            }
        }
    }

    if voxels.is_empty() {
        voxels.push(Vec3::ZERO);
    }
    Ok((voxels, spacing))
}

#[derive(Component, Debug, Clone)]
pub struct VoxelBuoyantObject {
    pub id: QueryId,
    /// Pose of the rapier body as of the last [`Self::sync_body`]
    pub transform: Transform,
    pub rigid_body: RigidBodyState,
    half_extents: Vec3,
    voxel_spacing: f32,
    /// Voxel centers in local space
    voxels: Vec<Vec3>,
    voxels_world: Vec<Vec3>,
    surfaces: Vec<WaterSurface>,
    volume: f32,
    local_archimedes_force: Vec3,
    buoyant_force: PhysicsForce,
}

impl VoxelBuoyantObject {
    pub fn new(
        id: QueryId,
        transform: Transform,
        half_extents: Vec3,
        voxel_spacing: f32,
        rigid_body: RigidBodyState,
    ) -> Result<Self, WaterError> {
        let mut object = Self {
            id,
            transform,
            rigid_body,
            half_extents,
            voxel_spacing,
            voxels: Vec::new(),
            voxels_world: Vec::new(),
            surfaces: Vec::new(),
            volume: 0.0,
            local_archimedes_force: Vec3::ZERO,
            buoyant_force: PhysicsForce::default(),
        };
        object.set_voxel_spacing(voxel_spacing)?;
        Ok(object)
    }

    /// Re-slices the body. The sample count changes with the voxel count.
    pub fn set_voxel_spacing(&mut self, spacing: f32) -> Result<(), WaterError> {
        let (voxels, spacing) = voxelize_box(self.half_extents, spacing)?;
        self.volume = volume_from_voxels(voxels.len(), spacing);
        self.local_archimedes_force = local_archimedes_force(voxels.len(), self.volume);
        self.voxel_spacing = spacing;
        self.voxels = voxels;
        self.surfaces.clear();
        debug!(
            "Query {} sliced into {} voxels, volume {:.3}",
            self.id,
            self.voxels.len(),
            self.volume
        );
        self.local_to_world();
        Ok(())
    }

    pub fn voxels(&self) -> &[Vec3] {
        &self.voxels
    }

    pub fn voxel_spacing(&self) -> f32 {
        self.voxel_spacing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn local_archimedes_force(&self) -> Vec3 {
        self.local_archimedes_force
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Force from the most recent [`Self::apply_buoyancy`].
    pub fn buoyant_force(&self) -> PhysicsForce {
        self.buoyant_force
    }

    pub fn world_center_of_mass(&self) -> Vec3 {
        self.transform.transform_point(self.rigid_body.center_of_mass)
    }

    /// Moves the voxel centers into world space.
    pub fn local_to_world(&mut self) {
        let transform = self.transform;
        self.voxels_world.clear();
        self.voxels_world
            .extend(self.voxels.iter().map(|voxel| transform.transform_point(*voxel)));
    }

    /// Buoyancy from the latest surface results, zero until results arrive.
    pub fn compute_buoyancy(&self) -> PhysicsForce {
        if self.surfaces.len() != self.voxels_world.len() {
            return PhysicsForce::default();
        }
        buoyancy_force(
            &self.voxels_world,
            &self.surfaces,
            self.voxel_spacing,
            &self.rigid_body,
            self.world_center_of_mass(),
            self.local_archimedes_force,
        )
    }

    /// Dry drag scaled up with the submerged fraction.
    pub fn damping(&self) -> Damping {
        let submerged = self.buoyant_force.submerged;
        Damping {
            linear_damping: self.rigid_body.linear_drag
                * (1.0 + submerged * SUBMERGED_LINEAR_DRAG),
            angular_damping: self.rigid_body.angular_drag
                * (1.0 + submerged * SUBMERGED_ANGULAR_DRAG),
        }
    }

    /// Pulls in the pose and velocity rapier produced and moves the voxels along.
    pub fn sync_body(&mut self, transform: &Transform, velocity: &Velocity) {
        self.transform = *transform;
        self.rigid_body.velocity = velocity.linvel;
        self.rigid_body.angular_velocity = velocity.angvel;
        self.local_to_world();
    }

    /// Recomputes buoyancy from the latest results and hands it to rapier.
    pub fn apply_buoyancy(&mut self, external_force: &mut ExternalForce, damping: &mut Damping) {
        self.buoyant_force = self.compute_buoyancy();
        external_force.force = self.buoyant_force.force;
        external_force.torque = self.buoyant_force.torque;
        *damping = self.damping();
    }
}

impl WaterQuery for VoxelBuoyantObject {
    fn query_id(&self) -> QueryId {
        self.id
    }

    fn query_count(&self) -> usize {
        self.voxels.len()
    }

    fn set_query_positions(&mut self, samples: &mut [WaterSample]) {
        for (sample, position) in samples.iter_mut().zip(&self.voxels_world) {
            sample.position = *position;
        }
    }

    fn get_query_results(&mut self, surfaces: &[WaterSurface]) {
        self.surfaces.clear();
        self.surfaces.extend_from_slice(surfaces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::WaterBodyId;
    use crate::GRAVITY;

    fn unit_cube() -> VoxelBuoyantObject {
        VoxelBuoyantObject::new(
            QueryId(1),
            Transform::IDENTITY,
            Vec3::splat(0.5),
            0.25,
            RigidBodyState::new(500.0),
        )
        .unwrap()
    }

    #[test]
    fn test_voxels_stay_inside_box() {
        let (voxels, spacing) = voxelize_box(Vec3::new(1.0, 0.5, 2.0), 0.5).unwrap();
        assert_eq!(spacing, 0.5);
        assert!(!voxels.is_empty());
        assert!(voxels
            .iter()
            .all(|v| v.x.abs() <= 1.001 && v.y.abs() <= 0.501 && v.z.abs() <= 2.001));
    }

    #[test]
    fn test_small_box_shrinks_spacing() {
        let (voxels, spacing) = voxelize_box(Vec3::splat(0.05), 10.0).unwrap();
        assert!(spacing < 10.0);
        assert!(!voxels.is_empty());
    }

    #[test]
    fn test_voxel_limit() {
        assert!(matches!(
            voxelize_box(Vec3::splat(50.0), 0.1),
            Err(WaterError::InvalidSettings(_))
        ));
        assert!(voxelize_box(Vec3::ONE, 0.0).is_err());
    }

    #[test]
    fn test_archimedes_share_matches_volume() {
        let cube = unit_cube();
        let total = cube.local_archimedes_force() * cube.voxels().len() as f32;
        assert!((total.y - 1000.0 * GRAVITY * cube.volume()).abs() < 1.0);
        assert_eq!(cube.query_count(), cube.voxels().len());
    }

    #[test]
    fn test_submerged_cube_is_pushed_up() {
        let mut cube = unit_cube();
        cube.sync_body(&Transform::from_xyz(0.0, -2.0, 0.0), &Velocity::zero());

        let mut samples = vec![WaterSample::default(); cube.query_count()];
        cube.set_query_positions(&mut samples);
        assert!(samples.iter().all(|s| s.position.y < -1.0));
        let surfaces: Vec<WaterSurface> = samples
            .iter()
            .map(|s| WaterSurface::flat(s.position, 0.0, 20.0, WaterBodyId(1)))
            .collect();
        cube.get_query_results(&surfaces);

        let mut external_force = ExternalForce::default();
        let mut damping = Damping::default();
        cube.apply_buoyancy(&mut external_force, &mut damping);

        assert!((cube.buoyant_force().submerged - 1.0).abs() < 1e-4);
        assert!((external_force.force.y - 1000.0 * GRAVITY * cube.volume()).abs() < 1.0);
        assert!(external_force.torque.length() < 1e-2);
        assert!((damping.linear_damping - 0.1 * (1.0 + SUBMERGED_LINEAR_DRAG)).abs() < 1e-4);
        assert!((damping.angular_damping - 0.05 * (1.0 + SUBMERGED_ANGULAR_DRAG)).abs() < 1e-4);
    }

    #[test]
    fn test_sinking_cube_is_damped_by_water() {
        let mut cube = unit_cube();
        let velocity = Velocity::linear(Vec3::new(0.0, -3.0, 0.0));
        cube.sync_body(&Transform::from_xyz(0.0, -2.0, 0.0), &velocity);
        let surfaces = vec![WaterSurface::flat(Vec3::ZERO, 0.0, 20.0, WaterBodyId(1)); cube.query_count()];
        cube.get_query_results(&surfaces);

        let mut external_force = ExternalForce::default();
        let mut damping = Damping::default();
        cube.apply_buoyancy(&mut external_force, &mut damping);

        let still = 1000.0 * GRAVITY * cube.volume();
        assert!(external_force.force.y > still);
    }

    #[test]
    fn test_no_results_means_no_force() {
        let mut cube = unit_cube();
        let mut external_force = ExternalForce {
            force: Vec3::ONE,
            torque: Vec3::ONE,
        };
        let mut damping = Damping::default();
        cube.apply_buoyancy(&mut external_force, &mut damping);

        assert_eq!(cube.buoyant_force(), PhysicsForce::default());
        assert_eq!(external_force.force, Vec3::ZERO);
        assert_eq!(external_force.torque, Vec3::ZERO);
        assert_eq!(damping.linear_damping, 0.1);
    }
}
