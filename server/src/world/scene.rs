//! Scene description loaded at startup and spawned into the ECS world.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use shared::physics::{
    BuoyantBodyBundle, DebugWaterProbe, RigidBodyState, SimpleBuoyantObject, VoxelBuoyantObject,
    WaterEventTrigger,
};
use shared::water::{
    DepthSettings, FlowSettings, PhysicsSettings, QueryId, WaterBody, WaterBodyId, WaterShape,
    WavePreset,
};
use shared::WaterError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatSpawn {
    pub position: Vec3,
    pub sample_offset: Vec3,
}

impl Default for FloatSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            sample_offset: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelBodySpawn {
    pub position: Vec3,
    pub half_extents: Vec3,
    pub voxel_spacing: f32,
    pub mass: f32,
}

impl Default for VoxelBodySpawn {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 0.0),
            half_extents: Vec3::splat(0.5),
            voxel_spacing: 0.25,
            mass: 400.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSpawn {
    pub position: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSpawn {
    pub position: Vec3,
    pub dimensions: UVec2,
    pub spacing: f32,
}

impl Default for ProbeSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            dimensions: UVec2::new(8, 8),
            spacing: 2.0,
        }
    }
}

/// Everything a simulation run starts from.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneData {
    pub name: String,
    pub settings: PhysicsSettings,
    pub bodies: Vec<WaterBody>,
    pub floats: Vec<FloatSpawn>,
    pub voxel_bodies: Vec<VoxelBodySpawn>,
    pub triggers: Vec<TriggerSpawn>,
    pub probes: Vec<ProbeSpawn>,
}

impl Default for SceneData {
    fn default() -> Self {
        let ocean = WaterBody::new(WaterBodyId(1), WaterShape::default())
            .with_waves(Some(WavePreset::Ocean.to_settings()))
            .with_depth(Some(DepthSettings::default()))
            .with_flow(Some(FlowSettings::default()));

        Self {
            name: "default".to_string(),
            settings: PhysicsSettings::default(),
            bodies: vec![ocean],
            floats: vec![FloatSpawn::default()],
            voxel_bodies: vec![VoxelBodySpawn {
                position: Vec3::new(6.0, 2.0, 0.0),
                ..default()
            }],
            triggers: vec![TriggerSpawn {
                position: Vec3::new(-4.0, 0.0, 0.0),
            }],
            probes: vec![ProbeSpawn::default()],
        }
    }
}

impl SceneData {
    /// Checks settings and rejects bodies using the reserved unclaimed id.
    pub fn validate(&self) -> Result<(), WaterError> {
        self.settings.validate()?;
        if let Some(index) = self.bodies.iter().position(|body| !body.id.is_claimed()) {
            return Err(WaterError::InvalidSettings(format!(
                "water body {} uses the reserved id {}",
                index,
                WaterBodyId::UNCLAIMED.0
            )));
        }
        Ok(())
    }
}

/// Hands out query ids in spawn order, starting at 1.
#[derive(Resource, Debug, Default)]
pub struct QueryIdAllocator(u64);

impl QueryIdAllocator {
    pub fn next_id(&mut self) -> QueryId {
        self.0 += 1;
        QueryId(self.0)
    }
}

pub fn spawn_scene(
    mut commands: Commands,
    scene: Res<SceneData>,
    mut ids: ResMut<QueryIdAllocator>,
) {
    for body in &scene.bodies {
        commands.spawn(body.clone());
    }

    for float in &scene.floats {
        commands.spawn(
            SimpleBuoyantObject::new(ids.next_id(), Transform::from_translation(float.position))
                .with_sample_offset(float.sample_offset),
        );
    }

    for spawn in &scene.voxel_bodies {
        let id = ids.next_id();
        match VoxelBuoyantObject::new(
            id,
            Transform::from_translation(spawn.position),
            spawn.half_extents,
            spawn.voxel_spacing,
            RigidBodyState::new(spawn.mass),
        ) {
            Ok(object) => {
                commands.spawn(BuoyantBodyBundle::new(object));
            }
            Err(err) => warn!("Skipping voxel body {}: {}", id, err),
        }
    }

    for trigger in &scene.triggers {
        commands.spawn(WaterEventTrigger::new(ids.next_id(), trigger.position));
    }

    for probe in &scene.probes {
        commands.spawn(DebugWaterProbe::new(
            ids.next_id(),
            Transform::from_translation(probe.position),
            probe.dimensions,
            probe.spacing,
        ));
    }

    info!(
        "Spawned scene '{}': {} water bodies, {} consumers",
        scene.name,
        scene.bodies.len(),
        ids.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_round_trips_through_ron() {
        let scene = SceneData::default();
        let text = ron::ser::to_string(&scene).unwrap();
        let parsed: SceneData = ron::de::from_str(&text).unwrap();

        assert_eq!(parsed.name, "default");
        assert_eq!(parsed.bodies.len(), 1);
        assert!(parsed.bodies[0].modifiers.depth.is_some());
        assert_eq!(parsed.voxel_bodies[0].position, Vec3::new(6.0, 2.0, 0.0));
    }

    #[test]
    fn test_partial_scene_uses_defaults() {
        let parsed: SceneData = ron::de::from_str("(name: \"empty\", bodies: [])").unwrap();
        assert_eq!(parsed.name, "empty");
        assert!(parsed.bodies.is_empty());
        assert_eq!(parsed.settings.buoyancy_samples, shared::DEFAULT_BUOYANCY_SAMPLES);
    }

    #[test]
    fn test_reserved_body_id_is_rejected() {
        let mut scene = SceneData::default();
        assert!(scene.validate().is_ok());

        scene.bodies.push(WaterBody::new(WaterBodyId::UNCLAIMED, WaterShape::default()));
        assert!(matches!(
            scene.validate(),
            Err(WaterError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_query_ids_are_sequential() {
        let mut ids = QueryIdAllocator::default();
        assert_eq!(ids.next_id(), QueryId(1));
        assert_eq!(ids.next_id(), QueryId(2));
    }
}
