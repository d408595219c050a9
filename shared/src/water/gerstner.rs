//! Gerstner wave height field.
//!
//! CPU evaluation of summed trochoidal waves. The function is pure, so the job
//! graph can evaluate every sample in parallel.
//!
//! ## Per-wave terms
//!
//! ```text
//! ω      = 2π / wavelength
//! speed  = sqrt(g · ω)
//! Q      = PEAK / (amplitude · ω · N)
//! dir    = normalize((1 - omni) · (sin θ, cos θ) + omni · (P.xz - origin))
//! phase  = dot(dir, P.xz - omni · origin) · ω - t · speed
//! ```
//!
//! Horizontal displacement is `Q · amplitude · dir · cos(phase)`, vertical is
//! `sin(phase) · amplitude / N`. Dividing by the wave count `N` keeps the summed
//! displacement bounded no matter how many waves are stacked.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::math::Vec3;
//! use shared::water::{gerstner::height_field, Wave};
//!
//! let waves = [Wave::new(0.5, 0.0, 10.0)];
//! let surface = height_field(Vec3::ZERO, 0.0, &waves, 1.0, 0.0);
//! assert!(surface.position.y.abs() < 1e-5);
//! ```

use std::f32::consts::PI;

use bevy::math::{Vec2, Vec3};

use super::config::Wave;
use crate::GRAVITY;

/// Crest sharpness. Larger values pinch the crests.
pub const PEAK: f32 = 2.0;

/// Displaced surface point and its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Summed displacement relative to the undisturbed point, and the raw normal
/// accumulator with the vertical term in `z`.
#[inline]
fn accumulate(position: Vec2, time: f32, waves: &[Wave]) -> (Vec3, Vec3) {
    let count = waves.len() as f32;
    let mut offset = Vec3::ZERO;
    let mut normal = Vec3::ZERO;

    for wave in waves {
        let omni = if wave.omni_directional { 1.0 } else { 0.0 };
        let amplitude = wave.amplitude;
        let w = 2.0 * PI / wave.wavelength;
        let speed = (GRAVITY * w).sqrt();
        let q = PEAK / (amplitude * w * count);

        let heading = wave.direction.to_radians();
        let directional = Vec2::new(heading.sin(), heading.cos()) * (1.0 - omni);
        let radial = (position - wave.origin) * omni;
        let direction = (directional + radial).normalize_or_zero();

        let phase = direction.dot(position - wave.origin * omni) * w - time * speed;
        let (sin, cos) = phase.sin_cos();

        let lateral = direction * (q * amplitude * cos);
        offset.x += lateral.x;
        offset.z += lateral.y;
        offset.y += sin * amplitude / count;

        let wa = w * amplitude;
        let weight = amplitude / count;
        let slope = -(direction * wa * cos) * weight;
        normal.x += slope.x;
        normal.y += slope.y;
        normal.z += (1.0 - q * wa * sin) * weight;
    }

    (offset, normal)
}

/// Resolves the water surface for `position` at `time`.
///
/// `opacity` scales the displacement and the normal's slope, `level` is the
/// undisturbed water height. The result keeps the lateral Gerstner offset.
pub fn height_field(
    position: Vec3,
    time: f32,
    waves: &[Wave],
    opacity: f32,
    level: f32,
) -> HeightSample {
    let (offset, normal) = accumulate(Vec2::new(position.x, position.z), time, waves);
    let offset = offset * opacity.clamp(0.0, 1.0);

    HeightSample {
        position: Vec3::new(position.x + offset.x, level + offset.y, position.z + offset.z),
        normal: Vec3::new(normal.x * opacity, normal.z, normal.y * opacity).normalize_or(Vec3::Y),
    }
}

/// Vertical displacement only, without opacity or level.
pub fn wave_height(position: Vec3, time: f32, waves: &[Wave]) -> f32 {
    accumulate(Vec2::new(position.x, position.z), time, waves).0.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_wave() -> [Wave; 1] {
        [Wave::new(0.5, 0.0, 10.0)]
    }

    #[test]
    fn test_wave_height_at_origin() {
        let surface = height_field(Vec3::ZERO, 0.0, &single_wave(), 1.0, 0.0);
        // sin(0) = 0, the crest offset is pure lateral: Q·A = 2 / ω
        assert!(surface.position.y.abs() < 1e-5);
        assert!(surface.position.x.abs() < 1e-5);
        assert!((surface.position.z - 10.0 / PI).abs() < 1e-5);
    }

    #[test]
    fn test_quarter_wavelength_reference() {
        // phase = 2.5 · 2π/10 = π/2
        let surface = height_field(Vec3::new(0.0, 0.0, 2.5), 0.0, &single_wave(), 1.0, 0.0);
        assert!((surface.position.y - 0.5).abs() < 1e-5);
        assert!((surface.position.z - 2.5).abs() < 1e-5);
        assert!(surface.position.x.abs() < 1e-5);
    }

    #[test]
    fn test_height_field_is_deterministic() {
        let waves = [
            Wave::new(0.4, 30.0, 7.0),
            Wave::new(0.2, 120.0, 3.0),
            Wave::omni(0.3, 5.0, Vec2::new(4.0, -2.0)),
        ];
        let position = Vec3::new(12.3, 0.0, -4.7);
        let a = height_field(position, 3.25, &waves, 0.8, 1.0);
        let b = height_field(position, 3.25, &waves, 0.8, 1.0);
        assert_eq!(
            a.position.to_array().map(f32::to_bits),
            b.position.to_array().map(f32::to_bits)
        );
        assert_eq!(
            a.normal.to_array().map(f32::to_bits),
            b.normal.to_array().map(f32::to_bits)
        );
    }

    #[test]
    fn test_level_and_opacity() {
        let position = Vec3::new(1.0, 0.0, 2.5);
        let flat = height_field(position, 0.7, &single_wave(), 0.0, 3.0);
        assert_eq!(flat.position, Vec3::new(1.0, 3.0, 2.5));
        assert!(flat.normal.abs_diff_eq(Vec3::Y, 1e-6));

        let full = height_field(position, 0.7, &single_wave(), 1.0, 3.0);
        let half = height_field(position, 0.7, &single_wave(), 0.5, 3.0);
        assert!(((half.position.y - 3.0) * 2.0 - (full.position.y - 3.0)).abs() < 1e-5);
    }

    #[test]
    fn test_normal_is_normalized() {
        let waves = [Wave::new(0.4, 30.0, 7.0), Wave::new(0.2, 120.0, 3.0)];
        let surface = height_field(Vec3::new(5.0, 0.0, 5.0), 1.0, &waves, 1.0, 0.0);
        assert!((surface.normal.length() - 1.0).abs() < 1e-4);
        assert!(surface.normal.y > 0.0);
    }

    #[test]
    fn test_wave_height_varies_with_time() {
        let h1 = wave_height(Vec3::ZERO, 0.0, &single_wave());
        let h2 = wave_height(Vec3::ZERO, 1.0, &single_wave());
        assert!((h1 - h2).abs() > 0.001);
    }

    #[test]
    fn test_no_waves_is_flat() {
        let surface = height_field(Vec3::new(2.0, -1.0, 3.0), 4.0, &[], 1.0, 0.5);
        assert_eq!(surface.position, Vec3::new(2.0, 0.5, 3.0));
        assert_eq!(surface.normal, Vec3::Y);
    }
}
