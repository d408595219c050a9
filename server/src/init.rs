use crate::world::{self, load_from_file::load_scene_data};
use bevy::prelude::*;
use bevy_app::ScheduleRunnerPlugin;
use shared::physics::WaterRigidBodyPlugin;
use shared::water::WaterPhysics;
use std::path::PathBuf;
use std::time::Duration;

/// Startup options collected from the command line.
#[derive(Resource, Debug, Clone)]
pub struct ServerConfig {
    pub scene_path: PathBuf,
    /// Zero runs until interrupted
    pub max_ticks: u64,
    pub tick_rate: u64,
}

pub fn init(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_scene_data(&config.scene_path)?;

    let mut physics = WaterPhysics::new(scene.settings.clone())?;
    physics.setup();

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / config.tick_rate as f64,
        ))),
    );
    app.add_plugins(bevy::log::LogPlugin::default());
    app.add_plugins((bevy::transform::TransformPlugin, WaterRigidBodyPlugin));

    info!(
        "Starting water simulation '{}' at {} ticks per second",
        scene.name, config.tick_rate
    );

    app.insert_resource(physics);
    app.insert_resource(scene);
    app.insert_resource(config);

    world::setup_resources_and_events(&mut app);
    world::register_systems(&mut app);

    app.run();
    Ok(())
}
