use std::sync::Arc;

use bevy::math::Vec2;
use bevy::tasks::TaskPool;

use super::{for_body_samples, WaterModifier};
use crate::water::body::WaterBody;
use crate::water::config::FlowSettings;
use crate::water::jobs::{FrameData, FrameJob};
use crate::water::sample::WaterBodyId;

/// Applies the body's base current to its samples.
pub struct FlowModifier;

impl WaterModifier for FlowModifier {
    type Data = FlowSettings;
    type JobData = Vec2;

    const NAME: &'static str = "Flow";

    fn data(body: &WaterBody) -> Option<&FlowSettings> {
        body.modifiers.flow.as_ref()
    }

    fn build_job_data(&self, data: &FlowSettings) -> Vec2 {
        data.base_flow
    }

    fn job(&self, body: WaterBodyId, data: Arc<Vec2>) -> Box<dyn FrameJob> {
        Box::new(FlowJob { body, flow: *data })
    }
}

struct FlowJob {
    body: WaterBodyId,
    flow: Vec2,
}

impl FrameJob for FlowJob {
    fn name(&self) -> &'static str {
        "Flow"
    }

    fn run(&self, frame: &mut FrameData, pool: &TaskPool) {
        let flow = self.flow;
        for_body_samples(frame, pool, self.body, |_, surface| {
            surface.current = flow;
        });
    }
}
