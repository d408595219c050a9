use std::path::PathBuf;

use clap::Parser;
use server::init::{self, ServerConfig};
use shared::TICKS_PER_SECOND;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// RON scene describing water bodies and consumers
    #[arg(short, long, default_value = "server/scenes/default.ron")]
    scene: PathBuf,

    /// Number of ticks to simulate, 0 runs forever
    #[arg(short, long, default_value_t = 0)]
    ticks: u64,

    #[arg(short = 'r', long, default_value_t = TICKS_PER_SECOND)]
    tick_rate: u64,
}

fn main() {
    let args = Args::parse();

    if args.tick_rate < 1 || args.tick_rate > 240 {
        eprintln!("Error: tick_rate must be between 1 and 240 (inclusive).");
        eprintln!("Got: {}", args.tick_rate);
        std::process::exit(1);
    }

    let config = ServerConfig {
        scene_path: args.scene,
        max_ticks: args.ticks,
        tick_rate: args.tick_rate,
    };

    if let Err(err) = init::init(config) {
        eprintln!("Failed to start water simulation: {err}");
        std::process::exit(1);
    }
}
