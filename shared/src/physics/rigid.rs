use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Mass and motion of a simulated body as seen by the buoyancy math.
///
/// Velocities are copied from the physics engine every tick; the drags are the
/// dry values that submersion scales up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBodyState {
    pub mass: f32,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Center of mass in local space
    pub center_of_mass: Vec3,
    pub linear_drag: f32,
    pub angular_drag: f32,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RigidBodyState {
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            center_of_mass: Vec3::ZERO,
            linear_drag: 0.1,
            angular_drag: 0.05,
        }
    }

    pub fn with_drag(mut self, linear: f32, angular: f32) -> Self {
        self.linear_drag = linear;
        self.angular_drag = angular;
        self
    }

    /// Velocity of a world-space point attached to the body.
    pub fn point_velocity(&self, point: Vec3, world_center_of_mass: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - world_center_of_mass)
    }
}
