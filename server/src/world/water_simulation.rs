//! Per-tick water systems for the server.
//!
//! Each tick the scheduler hands every consumer the surfaces resolved for the
//! positions it submitted on the previous tick, then schedules the next frame.
//! Consumers react to those results afterwards:
//! - floats snap to the surface
//! - voxel bodies hand their buoyancy to rapier as an external force
//! - event triggers report entering and leaving the water

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Damping, ExternalForce, Velocity};
use shared::physics::{
    DebugWaterProbe, SimpleBuoyantObject, VoxelBuoyantObject, WaterEventTrigger, WaterEventType,
};
use shared::water::{QueryId, WaterBody, WaterPhysics, WaterQuery};
use shared::TICKS_PER_SECOND;
use std::collections::HashSet;

use crate::init::ServerConfig;

/// Fired when a trigger changes between in and out of the water.
#[derive(Event, Debug, Clone)]
pub struct WaterEvent {
    pub entity: Entity,
    pub query_id: QueryId,
    pub state: WaterEventType,
}

#[derive(Resource, Debug, Default)]
pub struct SimulationClock {
    pub ticks: u64,
}

/// Drives the water scheduler with every body and consumer in the world.
pub fn step_water_physics(
    time: Res<Time>,
    mut physics: ResMut<WaterPhysics>,
    bodies: Query<&WaterBody>,
    mut floats: Query<&mut SimpleBuoyantObject>,
    mut voxel_bodies: Query<&mut VoxelBuoyantObject>,
    mut triggers: Query<&mut WaterEventTrigger>,
    mut probes: Query<&mut DebugWaterProbe>,
    mut known: Local<HashSet<QueryId>>,
) {
    let mut bodies: Vec<&WaterBody> = bodies.iter().collect();
    bodies.sort_by_key(|body| body.id);

    let mut queries: Vec<&mut dyn WaterQuery> = Vec::new();
    for float in floats.iter_mut() {
        queries.push(float.into_inner());
    }
    for voxel_body in voxel_bodies.iter_mut() {
        queries.push(voxel_body.into_inner());
    }
    for trigger in triggers.iter_mut() {
        queries.push(trigger.into_inner());
    }
    for probe in probes.iter_mut() {
        queries.push(probe.into_inner());
    }
    queries.sort_by_key(|query| query.query_id());

    // Consumers that disappeared since the last tick give back their samples
    let present: HashSet<QueryId> = queries.iter().map(|query| query.query_id()).collect();
    for gone in known.difference(&present) {
        if let Some(range) = physics.remove_query(*gone) {
            debug!("Released {} samples of despawned query {}", range.len(), gone);
        }
    }
    *known = present;

    physics.update(time.elapsed_secs(), &bodies, &mut queries);
}

pub fn move_floats(time: Res<Time>, mut floats: Query<&mut SimpleBuoyantObject>) {
    let dt = time.delta_secs();
    for mut float in floats.iter_mut() {
        float.follow_surface(dt);
    }
}

/// Copies the pose rapier integrated into each voxel body before it samples the water.
pub fn sync_voxel_bodies(
    mut voxel_bodies: Query<(&mut VoxelBuoyantObject, &Transform, &Velocity)>,
) {
    for (mut voxel_body, transform, velocity) in voxel_bodies.iter_mut() {
        voxel_body.sync_body(transform, velocity);
    }
}

pub fn apply_voxel_buoyancy(
    mut voxel_bodies: Query<(&mut VoxelBuoyantObject, &mut ExternalForce, &mut Damping)>,
) {
    for (mut voxel_body, mut external_force, mut damping) in voxel_bodies.iter_mut() {
        voxel_body.apply_buoyancy(&mut external_force, &mut damping);
    }
}

pub fn check_water_triggers(
    mut triggers: Query<(Entity, &mut WaterEventTrigger)>,
    mut events: EventWriter<WaterEvent>,
) {
    for (entity, mut trigger) in triggers.iter_mut() {
        let update = trigger.check_state();
        if update.submerged_changed {
            events.write(WaterEvent {
                entity,
                query_id: trigger.id,
                state: update.state,
            });
        }
    }
}

pub fn log_water_events(mut events: EventReader<WaterEvent>) {
    for event in events.read() {
        info!(
            "Water trigger {} ({:?}): {:?}",
            event.query_id, event.entity, event.state
        );
    }
}

/// Logs a summary once per second of simulated ticks.
pub fn log_tick_summary(
    clock: Res<SimulationClock>,
    physics: Res<WaterPhysics>,
    probes: Query<&DebugWaterProbe>,
    voxel_bodies: Query<&VoxelBuoyantObject>,
) {
    if clock.ticks == 0 || clock.ticks % TICKS_PER_SECOND != 0 {
        return;
    }

    info!("Tick {}\n{}", clock.ticks, physics.debug_summary());

    for probe in probes.iter() {
        if let Some(stats) = probe.stats() {
            debug!(
                "Probe {}: height {:.3}..{:.3} (mean {:.3}), {} claimed",
                probe.id, stats.min_height, stats.max_height, stats.mean_height, stats.claimed
            );
        }
    }
    for voxel_body in voxel_bodies.iter() {
        debug!(
            "Voxel body {} at {:?}, submerged {:.2}",
            voxel_body.id,
            voxel_body.transform.translation,
            voxel_body.buoyant_force().submerged
        );
    }
}

pub fn advance_clock(
    mut clock: ResMut<SimulationClock>,
    config: Res<ServerConfig>,
    mut physics: ResMut<WaterPhysics>,
    mut exit: EventWriter<AppExit>,
) {
    clock.ticks += 1;
    if config.max_ticks > 0 && clock.ticks >= config.max_ticks {
        info!("Reached {} ticks, stopping", clock.ticks);
        physics.cleanup();
        exit.write(AppExit::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::scene::{SceneData, VoxelBodySpawn};
    use bevy_rapier3d::prelude::RigidBody;
    use crate::world::{register_systems, setup_resources_and_events};
    use bevy::time::TimePlugin;
    use shared::water::PhysicsSettings;
    use std::path::PathBuf;

    fn test_app(scene: SceneData, max_ticks: u64) -> App {
        let mut physics = WaterPhysics::new(PhysicsSettings::default().with_buoyancy_samples(1024))
            .unwrap();
        physics.setup();

        let mut app = App::new();
        app.add_plugins(TimePlugin);
        app.insert_resource(physics);
        app.insert_resource(scene);
        app.insert_resource(ServerConfig {
            scene_path: PathBuf::new(),
            max_ticks,
            tick_rate: TICKS_PER_SECOND,
        });
        setup_resources_and_events(&mut app);
        register_systems(&mut app);
        app
    }

    #[test]
    fn test_default_scene_registers_every_consumer() {
        let mut app = test_app(SceneData::default(), 0);
        app.update();
        app.update();

        let world = app.world();
        let physics = world.resource::<WaterPhysics>();
        // float + voxel body + trigger + probe
        assert_eq!(physics.query_count(), 4);
        assert!(physics.active_sample_count() > 64);
    }

    #[test]
    fn test_float_receives_surface_after_one_tick() {
        let mut app = test_app(SceneData::default(), 0);
        app.update();
        app.update();
        app.update();

        let mut floats = app.world_mut().query::<&SimpleBuoyantObject>();
        let float = floats.single(app.world()).unwrap();
        let surface = float.surface().unwrap();
        assert_eq!(surface.water_body_id.0, 1);
        assert!(surface.position.y.abs() < 2.0);
    }

    #[test]
    fn test_despawned_consumer_releases_samples() {
        let mut app = test_app(SceneData::default(), 0);
        app.update();
        app.update();

        let probe = {
            let world = app.world_mut();
            let mut probes = world.query_filtered::<Entity, With<DebugWaterProbe>>();
            probes.single(world).unwrap()
        };
        let before = app.world().resource::<WaterPhysics>().active_sample_count();
        app.world_mut().despawn(probe);
        app.update();

        let physics = app.world().resource::<WaterPhysics>();
        assert_eq!(physics.query_count(), 3);
        assert_eq!(physics.active_sample_count(), before - 64);
    }

    #[test]
    fn test_voxel_body_buoyancy_reaches_rapier() {
        let scene = SceneData {
            voxel_bodies: vec![VoxelBodySpawn {
                position: Vec3::new(6.0, -0.2, 0.0),
                ..default()
            }],
            ..default()
        };
        let mut app = test_app(scene, 0);
        for _ in 0..3 {
            app.update();
        }

        let mut bodies = app
            .world_mut()
            .query::<(&VoxelBuoyantObject, &RigidBody, &ExternalForce, &Damping)>();
        let (voxel_body, rigid_body, external_force, damping) =
            bodies.single(app.world()).unwrap();
        assert!(matches!(rigid_body, RigidBody::Dynamic));
        assert!(voxel_body.buoyant_force().submerged > 0.0);
        assert!(external_force.force.y > 0.0);
        assert!(damping.linear_damping > voxel_body.rigid_body.linear_drag);
    }

    #[test]
    fn test_stops_after_max_ticks() {
        let mut app = test_app(SceneData::default(), 3);
        for _ in 0..3 {
            app.update();
        }

        assert_eq!(app.world().resource::<SimulationClock>().ticks, 3);
        let exits = app.world().resource::<Events<AppExit>>();
        assert!(!exits.is_empty());
    }
}
