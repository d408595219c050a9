//! Water query consumers and the buoyancy math they share.

pub mod buoyancy;
pub mod events;
pub mod floating;
pub mod probe;
pub mod rapier;
pub mod rigid;
pub mod voxel;

pub use buoyancy::PhysicsForce;
pub use events::{WaterEventTrigger, WaterEventType, WaterEventUpdate};
pub use floating::SimpleBuoyantObject;
pub use probe::{DebugWaterProbe, ProbeStats};
pub use rapier::{BuoyantBodyBundle, WaterRigidBodyPlugin};
pub use rigid::RigidBodyState;
pub use voxel::VoxelBuoyantObject;
