use std::sync::Arc;

use bevy::tasks::TaskPool;
use bevy_log::warn;

use super::{for_body_samples, WaterModifier};
use crate::water::body::WaterBody;
use crate::water::config::DepthSettings;
use crate::water::depth::{depth_opacity, DepthProfile, DepthSampler, DepthSource};
use crate::water::jobs::{FrameData, FrameJob};
use crate::water::sample::WaterBodyId;

/// Writes water depth and the shoreline opacity the wave job scales by.
pub struct DepthModifier;

pub struct DepthJobData {
    pub source: DepthSource,
    pub max_range: f32,
    pub profile: DepthProfile,
    pub gamma: f32,
}

impl DepthJobData {
    /// Signed depth at `position` and the resulting opacity.
    pub fn evaluate(&self, position: bevy::math::Vec3) -> (f32, f32) {
        let depth = self.source.depth_at(position);
        (
            depth,
            depth_opacity(depth, self.max_range, &self.profile, self.gamma),
        )
    }
}

impl WaterModifier for DepthModifier {
    type Data = DepthSettings;
    type JobData = DepthJobData;

    const NAME: &'static str = "Depth";

    fn data(body: &WaterBody) -> Option<&DepthSettings> {
        body.modifiers.depth.as_ref()
    }

    fn build_job_data(&self, data: &DepthSettings) -> DepthJobData {
        let mut max_range = data.max_range;
        if max_range.is_nan() || max_range <= 0.0 {
            warn!(
                "Depth range {} is not positive, using {}",
                max_range,
                crate::MIN_WAVE_PARAM
            );
            max_range = crate::MIN_WAVE_PARAM;
        }
        DepthJobData {
            source: data.source.clone(),
            max_range,
            profile: data.profile.clone(),
            gamma: data.gamma.max(0.0),
        }
    }

    fn job(&self, body: WaterBodyId, data: Arc<DepthJobData>) -> Box<dyn FrameJob> {
        Box::new(DepthJob { body, data })
    }
}

struct DepthJob {
    body: WaterBodyId,
    data: Arc<DepthJobData>,
}

impl FrameJob for DepthJob {
    fn name(&self) -> &'static str {
        "Depth"
    }

    fn run(&self, frame: &mut FrameData, pool: &TaskPool) {
        let data = &self.data;
        for_body_samples(frame, pool, self.body, |sample, surface| {
            let (depth, opacity) = data.evaluate(sample.position);
            surface.depth = -depth;
            surface.opacity = opacity;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;

    #[test]
    fn test_shallow_water_is_transparent() {
        let settings = DepthSettings::default().with_source(DepthSource::Custom(Arc::new(
            |position: Vec3| -position.x,
        )));
        let data = DepthModifier.build_job_data(&settings);

        let (depth, shore) = data.evaluate(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(depth, 0.0);
        assert_eq!(shore, 0.0);

        let (depth, deep) = data.evaluate(Vec3::new(30.0, 0.0, 0.0));
        assert_eq!(depth, -30.0);
        assert_eq!(deep, 1.0);
    }

    #[test]
    fn test_invalid_range_is_clamped() {
        let settings = DepthSettings {
            max_range: 0.0,
            ..Default::default()
        };
        let data = DepthModifier.build_job_data(&settings);
        assert!(data.max_range > 0.0);
        assert!(data.evaluate(Vec3::ZERO).1.is_finite());
    }
}
