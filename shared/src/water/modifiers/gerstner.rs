use std::sync::Arc;

use bevy::tasks::TaskPool;
use bevy_log::warn;

use super::{for_body_samples, WaterModifier};
use crate::water::body::WaterBody;
use crate::water::config::{Wave, WaveSettings};
use crate::water::gerstner::height_field;
use crate::water::jobs::{FrameData, FrameJob};
use crate::water::sample::WaterBodyId;
use crate::MIN_WAVE_PARAM;

/// Displaces surfaces with the body's Gerstner wave set.
pub struct GerstnerWaves;

/// Wave set with every amplitude and wavelength bounded away from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct GerstnerJobData {
    pub waves: Vec<Wave>,
}

impl GerstnerJobData {
    pub fn new(mut waves: Vec<Wave>) -> Self {
        for (i, wave) in waves.iter_mut().enumerate() {
            if is_degenerate(wave.amplitude) || is_degenerate(wave.wavelength) {
                warn!(
                    "Wave {} has amplitude {} and wavelength {}, clamping to {}",
                    i, wave.amplitude, wave.wavelength, MIN_WAVE_PARAM
                );
                wave.amplitude = sanitize(wave.amplitude);
                wave.wavelength = sanitize(wave.wavelength);
            }
        }
        Self { waves }
    }
}

fn is_degenerate(value: f32) -> bool {
    value.is_nan() || value < MIN_WAVE_PARAM
}

fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        MIN_WAVE_PARAM
    } else {
        value.max(MIN_WAVE_PARAM)
    }
}

impl WaterModifier for GerstnerWaves {
    type Data = WaveSettings;
    type JobData = GerstnerJobData;

    const NAME: &'static str = "GerstnerWaves";

    fn data(body: &WaterBody) -> Option<&WaveSettings> {
        body.modifiers.waves.as_ref()
    }

    fn build_job_data(&self, data: &WaveSettings) -> GerstnerJobData {
        GerstnerJobData::new(data.resolve_waves())
    }

    fn job(&self, body: WaterBodyId, data: Arc<GerstnerJobData>) -> Box<dyn FrameJob> {
        Box::new(GerstnerJob { body, data })
    }
}

struct GerstnerJob {
    body: WaterBodyId,
    data: Arc<GerstnerJobData>,
}

impl FrameJob for GerstnerJob {
    fn name(&self) -> &'static str {
        "GerstnerWaves"
    }

    fn run(&self, frame: &mut FrameData, pool: &TaskPool) {
        let time = frame.time;
        let waves = &self.data.waves;
        for_body_samples(frame, pool, self.body, |sample, surface| {
            let result = height_field(
                sample.position,
                time,
                waves,
                surface.opacity,
                surface.position.y,
            );
            surface.position = result.position;
            surface.normal = result.normal;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_waves_are_clamped() {
        let data = GerstnerJobData::new(vec![
            Wave::new(0.0, 0.0, 10.0),
            Wave::new(0.5, 0.0, -3.0),
            Wave::new(f32::NAN, 0.0, 4.0),
            Wave::new(0.5, 90.0, 4.0),
        ]);
        assert_eq!(data.waves[0].amplitude, MIN_WAVE_PARAM);
        assert_eq!(data.waves[1].wavelength, MIN_WAVE_PARAM);
        assert_eq!(data.waves[2].amplitude, MIN_WAVE_PARAM);
        assert_eq!(data.waves[3], Wave::new(0.5, 90.0, 4.0));
    }

    #[test]
    fn test_clamped_waves_stay_finite() {
        let data = GerstnerJobData::new(vec![Wave::new(0.0, 0.0, 0.0)]);
        let position = bevy::math::Vec3::new(1.0, 0.0, 1.0);
        let surface = height_field(position, 2.0, &data.waves, 1.0, 0.0);
        assert!(surface.position.is_finite());
        assert!(surface.normal.is_finite());
    }
}
