//! Rapier rigid bodies for voxel buoyant objects.
//!
//! Buoyancy is computed from water results and written into the body's
//! `ExternalForce` and `Damping`. Rapier integrates the motion.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::voxel::VoxelBuoyantObject;
use crate::GRAVITY;

/// Bundle for spawning a voxel buoyant object as a dynamic rapier body.
#[derive(Bundle)]
pub struct BuoyantBodyBundle {
    pub object: VoxelBuoyantObject,
    pub transform: Transform,
    pub body: RigidBody,
    pub collider: Collider,
    pub mass: ColliderMassProperties,
    pub velocity: Velocity,
    pub external_force: ExternalForce,
    pub damping: Damping,
}

impl BuoyantBodyBundle {
    pub fn new(object: VoxelBuoyantObject) -> Self {
        let half_extents = object.half_extents();
        let transform = object.transform;
        let mass = object.rigid_body.mass;
        let velocity = Velocity {
            linvel: object.rigid_body.velocity,
            angvel: object.rigid_body.angular_velocity,
        };
        let damping = object.damping();
        Self {
            object,
            transform,
            body: RigidBody::Dynamic,
            collider: Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            mass: ColliderMassProperties::Mass(mass),
            velocity,
            external_force: ExternalForce::default(),
            damping,
        }
    }
}

/// Adds rapier with world gravity for buoyant bodies.
pub struct WaterRigidBodyPlugin;

impl Plugin for WaterRigidBodyPlugin {
    fn build(&self, app: &mut App) {
        // RapierConfiguration lives on the context entity in 0.30, so gravity is
        // set once that entity exists
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
        app.add_systems(Startup, configure_rapier_context);
    }
}

fn configure_rapier_context(mut query: Query<&mut RapierConfiguration>) {
    for mut config in query.iter_mut() {
        config.gravity = Vec3::new(0.0, -GRAVITY, 0.0);
        config.physics_pipeline_active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RigidBodyState;
    use crate::water::QueryId;

    fn crate_box() -> VoxelBuoyantObject {
        VoxelBuoyantObject::new(
            QueryId(3),
            Transform::from_xyz(1.0, 2.0, 3.0),
            Vec3::new(1.0, 0.5, 0.5),
            0.25,
            RigidBodyState::new(200.0).with_drag(0.2, 0.1),
        )
        .unwrap()
    }

    #[test]
    fn test_buoyant_body_bundle_creation() {
        let bundle = BuoyantBodyBundle::new(crate_box());
        assert!(matches!(bundle.body, RigidBody::Dynamic));
        assert!(matches!(bundle.mass, ColliderMassProperties::Mass(m) if m == 200.0));
        assert_eq!(bundle.transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bundle.external_force.force, Vec3::ZERO);
    }

    #[test]
    fn test_dry_body_uses_base_damping() {
        let bundle = BuoyantBodyBundle::new(crate_box());
        assert_eq!(bundle.damping.linear_damping, 0.2);
        assert_eq!(bundle.damping.angular_damping, 0.1);
    }
}
