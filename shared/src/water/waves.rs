//! Procedural wave set generation.

use bevy::math::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::config::{BasicWaves, Wave};

/// Per-wave seed offset, so every wave draws from its own stream.
const WAVE_SEED_STRIDE: u64 = 123456;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Builds `basic.wave_count` waves around the base amplitude, heading and wavelength.
///
/// Early waves are short and low, later waves long and high. Each wave reseeds its
/// own generator from `seed + i * stride`, so the output only depends on the
/// parameters. Amplitudes are not normalized here; the height field divides by
/// the wave count.
pub fn generate_waves(basic: &BasicWaves) -> Vec<Wave> {
    let count = basic.wave_count;
    (0..count)
        .map(|i| {
            let mut rng =
                StdRng::seed_from_u64(basic.seed.wrapping_add(i as u64 * WAVE_SEED_STRIDE));
            let p = lerp(0.1, 1.9, i as f32 / count as f32);

            let amplitude = basic.amplitude * p * rng.gen_range(0.5..=2.0);
            let direction = basic.direction + rng.gen_range(-90.0..=90.0);
            let wavelength = basic.wavelength * p * rng.gen_range(0.6..=1.4);

            Wave {
                amplitude,
                direction,
                wavelength,
                origin: Vec2::ZERO,
                omni_directional: false,
            }
        })
        .collect()
}
