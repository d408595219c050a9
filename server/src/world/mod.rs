pub mod load_from_file;
pub mod scene;
pub mod water_simulation;

use bevy::prelude::*;
use scene::{spawn_scene, QueryIdAllocator};
use water_simulation::{
    advance_clock, apply_voxel_buoyancy, check_water_triggers, log_tick_summary,
    log_water_events, move_floats, step_water_physics, sync_voxel_bodies, SimulationClock,
    WaterEvent,
};

pub fn setup_resources_and_events(app: &mut App) {
    app.insert_resource(QueryIdAllocator::default())
        .insert_resource(SimulationClock::default())
        .add_event::<WaterEvent>();
}

pub fn register_systems(app: &mut App) {
    app.add_systems(Startup, spawn_scene);

    app.add_systems(
        Update,
        (
            sync_voxel_bodies,
            step_water_physics,
            (move_floats, apply_voxel_buoyancy, check_water_triggers),
            log_water_events,
            log_tick_summary,
            advance_clock,
        )
            .chain(),
    );
}
