//! Authored configuration for the water physics engine.
//!
//! These types are plain serde data so they can be loaded from scene files and
//! compared by content. Modifier settings (`WaveSettings`, `DepthSettings`,
//! `FlowSettings`) hang off each water body; `PhysicsSettings` configures the
//! scheduler itself.

use std::hash::Hasher;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::depth::{DepthProfile, DepthSource};
use super::hash::{ContentHasher, ModifierData};
use super::waves::generate_waves;
use crate::error::WaterError;

pub mod constants {
    /// Fewest waves a basic wave set should use
    pub const MIN_WAVE_COUNT: usize = 3;
    /// Most waves a basic wave set should use
    pub const MAX_WAVE_COUNT: usize = 12;
    /// Default seed for procedural waves
    pub const DEFAULT_WAVE_SEED: u64 = 123456;
    /// Exponent applied to shoreline opacity
    pub const DEFAULT_DEPTH_GAMMA: f32 = 0.4545;
    /// Depth over which the shoreline profile is spread
    pub const DEFAULT_DEPTH_RANGE: f32 = 20.0;
}

use constants::*;

/// A single Gerstner wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wave {
    pub amplitude: f32,
    /// Heading in degrees, 0 travels along +z
    pub direction: f32,
    pub wavelength: f32,
    /// Center for omni-directional waves
    pub origin: Vec2,
    /// Radiate from `origin` instead of travelling along `direction`
    pub omni_directional: bool,
}

impl Default for Wave {
    fn default() -> Self {
        Self::new(0.5, 45.0, 5.0)
    }
}

impl Wave {
    pub fn new(amplitude: f32, direction: f32, wavelength: f32) -> Self {
        Self {
            amplitude,
            direction,
            wavelength,
            origin: Vec2::ZERO,
            omni_directional: false,
        }
    }

    pub fn omni(amplitude: f32, wavelength: f32, origin: Vec2) -> Self {
        Self {
            origin,
            omni_directional: true,
            ..Self::new(amplitude, 0.0, wavelength)
        }
    }

    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_f32(self.amplitude);
        hasher.write_f32(self.direction);
        hasher.write_f32(self.wavelength);
        hasher.write_vec2(self.origin);
        hasher.write_bool(self.omni_directional);
    }
}

/// Parameters for procedurally generated waves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicWaves {
    pub wave_count: usize,
    pub amplitude: f32,
    pub direction: f32,
    pub wavelength: f32,
    pub seed: u64,
}

impl Default for BasicWaves {
    fn default() -> Self {
        Self {
            wave_count: 6,
            amplitude: 0.5,
            direction: 45.0,
            wavelength: 5.0,
            seed: DEFAULT_WAVE_SEED,
        }
    }
}

impl BasicWaves {
    pub fn with_wave_count(mut self, wave_count: usize) -> Self {
        self.wave_count = wave_count.clamp(MIN_WAVE_COUNT, MAX_WAVE_COUNT);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaveType {
    #[default]
    Basic,
    Manual,
}

/// Wave modifier settings of a water body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    pub wave_type: WaveType,
    pub basic: BasicWaves,
    /// Used as-is when `wave_type` is `Manual`
    pub waves: Vec<Wave>,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self::basic(BasicWaves::default())
    }
}

impl WaveSettings {
    pub fn basic(basic: BasicWaves) -> Self {
        Self {
            wave_type: WaveType::Basic,
            basic,
            waves: Vec::new(),
        }
    }

    pub fn manual(waves: Vec<Wave>) -> Self {
        Self {
            wave_type: WaveType::Manual,
            basic: BasicWaves::default(),
            waves,
        }
    }

    /// The wave set this configuration describes.
    pub fn resolve_waves(&self) -> Vec<Wave> {
        match self.wave_type {
            WaveType::Basic => generate_waves(&self.basic),
            WaveType::Manual => self.waves.clone(),
        }
    }
}

impl ModifierData for WaveSettings {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        match self.wave_type {
            WaveType::Basic => {
                hasher.write_u8(0);
                hasher.write_usize(self.basic.wave_count);
                hasher.write_f32(self.basic.amplitude);
                hasher.write_f32(self.basic.direction);
                hasher.write_f32(self.basic.wavelength);
                hasher.write_u64(self.basic.seed);
            }
            WaveType::Manual => {
                hasher.write_u8(1);
                hasher.write_usize(self.waves.len());
                for wave in &self.waves {
                    wave.hash_content(hasher);
                }
            }
        }
    }
}

/// Preset wave configurations for different water types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum WavePreset {
    /// Completely still water (no waves)
    Still,
    /// Calm water with minimal waves
    Calm,
    /// Lake with gentle waves
    Lake,
    /// Standard ocean waves
    #[default]
    Ocean,
    /// Stormy ocean with large waves
    Storm,
}

impl WavePreset {
    pub fn to_settings(self) -> WaveSettings {
        let basic = BasicWaves::default();
        match self {
            WavePreset::Still => WaveSettings::manual(Vec::new()),
            WavePreset::Calm => WaveSettings::basic(BasicWaves {
                wave_count: 3,
                amplitude: 0.1,
                wavelength: 6.0,
                ..basic
            }),
            WavePreset::Lake => WaveSettings::basic(BasicWaves {
                wave_count: 4,
                amplitude: 0.25,
                wavelength: 4.0,
                ..basic
            }),
            WavePreset::Ocean => WaveSettings::basic(basic),
            WavePreset::Storm => WaveSettings::basic(BasicWaves {
                wave_count: 8,
                amplitude: 1.5,
                wavelength: 20.0,
                ..basic
            }),
        }
    }
}

/// Depth modifier settings of a water body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthSettings {
    pub source: DepthSource,
    /// Depth at which waves reach full strength
    pub max_range: f32,
    pub profile: DepthProfile,
    pub gamma: f32,
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self {
            source: DepthSource::default(),
            max_range: DEFAULT_DEPTH_RANGE,
            profile: DepthProfile::default(),
            gamma: DEFAULT_DEPTH_GAMMA,
        }
    }
}

impl DepthSettings {
    pub fn with_source(mut self, source: DepthSource) -> Self {
        self.source = source;
        self
    }
}

impl ModifierData for DepthSettings {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        self.source.hash_content(hasher);
        hasher.write_f32(self.max_range);
        self.profile.hash_content(hasher);
        hasher.write_f32(self.gamma);
    }
}

/// Flow modifier settings of a water body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Current applied to every sample of the body (x, z)
    pub base_flow: Vec2,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            base_flow: Vec2::new(0.0, 1.0),
        }
    }
}

impl ModifierData for FlowSettings {
    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_vec2(self.base_flow);
    }
}

/// Which modifiers the scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierToggles {
    pub waves: bool,
    pub depth: bool,
    pub flow: bool,
}

impl Default for ModifierToggles {
    fn default() -> Self {
        Self {
            waves: true,
            depth: true,
            flow: true,
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Size of the shared sample and result buffers
    pub buoyancy_samples: usize,
    /// Samples per parallel task
    pub batch_size: usize,
    /// Surface height reported for samples outside every water body
    pub fallback_water_level: f32,
    /// Depth seeded into surfaces before the depth modifier runs
    pub default_depth: f32,
    pub modifiers: ModifierToggles,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            buoyancy_samples: crate::DEFAULT_BUOYANCY_SAMPLES,
            batch_size: crate::DEFAULT_BATCH_SIZE,
            fallback_water_level: 0.0,
            default_depth: crate::DEFAULT_WATER_DEPTH,
            modifiers: ModifierToggles::default(),
        }
    }
}

impl PhysicsSettings {
    pub fn with_buoyancy_samples(mut self, buoyancy_samples: usize) -> Self {
        self.buoyancy_samples = buoyancy_samples;
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifierToggles) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn validate(&self) -> Result<(), WaterError> {
        if self.buoyancy_samples == 0 {
            return Err(WaterError::InvalidSettings(
                "buoyancy_samples must be greater than zero".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(WaterError::InvalidSettings(
                "batch_size must be greater than zero".into(),
            ));
        }
        if !self.default_depth.is_finite() || self.default_depth < 0.0 {
            return Err(WaterError::InvalidSettings(format!(
                "default_depth must be a non-negative number, got {}",
                self.default_depth
            )));
        }
        Ok(())
    }
}
