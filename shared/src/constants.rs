pub const TICKS_PER_SECOND: u64 = 30;

/// Gravity used by the wave dispersion relation (m/s²)
pub const GRAVITY: f32 = 9.8;

/// Default size of the shared sample/result buffers.
pub const DEFAULT_BUOYANCY_SAMPLES: usize = 4096;

/// Samples handed to a single parallel-for task.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Depth written into freshly seeded surfaces before the depth modifier runs.
pub const DEFAULT_WATER_DEPTH: f32 = 20.0;

/// Depth reported for positions outside a depth map.
pub const OUT_OF_MAP_DEPTH: f32 = -999.0;

/// Lower bound applied to wave amplitude and wavelength before job data is built.
pub const MIN_WAVE_PARAM: f32 = 1.0e-4;
