//! Frame job graph.
//!
//! A frame's buffers are moved into a single task that runs every scheduled job
//! in order and hands the buffers back when it finishes. Each job fans its work
//! out over the task pool in fixed-size batches. While the task is in flight the
//! scheduler holds no reference to the buffers, so nothing can touch them until
//! the handle is completed.
//!
//! ## Stages
//!
//! ```text
//! BoundsCheck ─▶ WaterBodyLookup ─▶ SurfacePrep ─▶ modifier jobs (per body)
//!  parallel        reduction          parallel         parallel
//! ```

use std::ops::Range;
use std::sync::Arc;

use bevy::tasks::{Task, TaskPool};
use futures_lite::future;

use super::body::WaterBodyData;
use super::sample::{WaterBodyId, WaterSample, WaterSurface};

/// Buffers and per-frame inputs owned by the job graph while it runs.
#[derive(Debug, Clone, Default)]
pub struct FrameData {
    pub samples: Vec<WaterSample>,
    /// Write buffer, copied into the read buffer once the frame completes
    pub surfaces: Vec<WaterSurface>,
    pub bodies: Vec<WaterBodyData>,
    /// Number of claimed samples at the front of the buffers
    pub active: usize,
    pub time: f32,
    pub batch_size: usize,
}

impl FrameData {
    pub fn with_capacity(capacity: usize, batch_size: usize) -> Self {
        Self {
            samples: vec![WaterSample::default(); capacity],
            surfaces: vec![WaterSurface::default(); capacity],
            bodies: Vec::new(),
            active: 0,
            time: 0.0,
            batch_size,
        }
    }

    /// Sample window claimed by `body`, empty when the body claimed nothing.
    pub fn body_window(&self, body: WaterBodyId) -> Range<usize> {
        self.bodies
            .iter()
            .find(|data| data.id == body)
            .map(|data| data.offset.clone())
            .unwrap_or(0..0)
    }

    /// Active samples with their write-buffer slots, restricted to `window`.
    pub fn split_window(&mut self, window: Range<usize>) -> (&[WaterSample], &mut [WaterSurface]) {
        let window = window.start.min(self.active)..window.end.min(self.active);
        (&self.samples[window.clone()], &mut self.surfaces[window])
    }
}

/// One stage of the frame graph.
pub trait FrameJob: Send + 'static {
    fn name(&self) -> &'static str;

    fn run(&self, frame: &mut FrameData, pool: &TaskPool);
}

/// Jobs that run one after another, each seeing the previous one's output.
#[derive(Default)]
pub struct JobChain {
    jobs: Vec<Box<dyn FrameJob>>,
}

impl JobChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, job: impl FrameJob) -> Self {
        self.push(job);
        self
    }

    pub fn push(&mut self, job: impl FrameJob) {
        self.jobs.push(Box::new(job));
    }

    pub fn push_boxed(&mut self, job: Box<dyn FrameJob>) {
        self.jobs.push(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|job| job.name()).collect()
    }

    /// Runs the chain on the calling thread.
    pub fn run(self, frame: &mut FrameData, pool: &TaskPool) {
        for job in &self.jobs {
            job.run(frame, pool);
        }
    }

    /// Moves `frame` into a task on `pool` and returns without waiting.
    pub fn schedule(self, pool: Arc<TaskPool>, mut frame: FrameData) -> JobHandle {
        let task_pool = pool.clone();
        let task = pool.spawn(async move {
            self.run(&mut frame, &task_pool);
            frame
        });
        JobHandle { task }
    }
}

/// In-flight frame. Completing it blocks until every job has run.
pub struct JobHandle {
    task: Task<FrameData>,
}

impl JobHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn complete(self) -> FrameData {
        future::block_on(self.task)
    }
}

/// Calls `f(index, item)` for every item, split into batches across the pool.
pub fn par_for<T, F>(pool: &TaskPool, items: &mut [T], batch_size: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Send + Sync,
{
    let batch_size = batch_size.max(1);
    if items.len() <= batch_size {
        items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
        return;
    }

    let f = &f;
    pool.scope(|scope| {
        for (batch, chunk) in items.chunks_mut(batch_size).enumerate() {
            scope.spawn(async move {
                let base = batch * batch_size;
                for (i, item) in chunk.iter_mut().enumerate() {
                    f(base + i, item);
                }
            });
        }
    });
}

/// Like [`par_for`] but pairs every output with the input at the same index.
pub fn par_zip_for<I, O, F>(pool: &TaskPool, inputs: &[I], outputs: &mut [O], batch_size: usize, f: F)
where
    I: Sync,
    O: Send,
    F: Fn(&I, &mut O) + Send + Sync,
{
    let batch_size = batch_size.max(1);
    let len = inputs.len().min(outputs.len());
    let (inputs, outputs) = (&inputs[..len], &mut outputs[..len]);
    if len <= batch_size {
        inputs.iter().zip(outputs.iter_mut()).for_each(|(i, o)| f(i, o));
        return;
    }

    let f = &f;
    pool.scope(|scope| {
        for (input, output) in inputs.chunks(batch_size).zip(outputs.chunks_mut(batch_size)) {
            scope.spawn(async move {
                input.iter().zip(output.iter_mut()).for_each(|(i, o)| f(i, o));
            });
        }
    });
}

/// Tags each active sample with the last enabled body that contains it.
///
/// Bodies using the reserved unclaimed id never claim samples.
pub struct BoundsCheckJob;

impl FrameJob for BoundsCheckJob {
    fn name(&self) -> &'static str {
        "BoundsCheck"
    }

    fn run(&self, frame: &mut FrameData, pool: &TaskPool) {
        let FrameData {
            samples,
            bodies,
            active,
            batch_size,
            ..
        } = frame;
        let bodies: &[WaterBodyData] = bodies;

        par_for(pool, &mut samples[..*active], *batch_size, |_, sample| {
            for body in bodies.iter().filter(|body| body.enabled && body.id.is_claimed()) {
                if body.contains(sample.position) {
                    sample.water_body_id = body.id;
                }
            }
        });
    }
}

/// Reduces the classified samples to a per-body index window.
pub struct WaterBodyLookupJob;

impl FrameJob for WaterBodyLookupJob {
    fn name(&self) -> &'static str {
        "WaterBodyLookup"
    }

    fn run(&self, frame: &mut FrameData, _pool: &TaskPool) {
        for body in frame.bodies.iter_mut() {
            body.offset = 0..0;
        }

        for (index, sample) in frame.samples[..frame.active].iter().enumerate() {
            if !sample.water_body_id.is_claimed() {
                continue;
            }
            if let Some(body) = frame
                .bodies
                .iter_mut()
                .find(|body| body.id == sample.water_body_id)
            {
                if body.offset.is_empty() {
                    body.offset = index..index + 1;
                } else {
                    body.offset.end = index + 1;
                }
            }
        }
    }
}

/// Seeds every active surface with a flat result at its body's level.
pub struct SurfacePrepJob {
    pub fallback_level: f32,
    pub default_depth: f32,
}

impl FrameJob for SurfacePrepJob {
    fn name(&self) -> &'static str {
        "SurfacePrep"
    }

    fn run(&self, frame: &mut FrameData, pool: &TaskPool) {
        let levels: Vec<(WaterBodyId, f32)> = frame
            .bodies
            .iter()
            .filter(|body| body.id.is_claimed())
            .map(|body| (body.id, body.level()))
            .collect();
        let batch_size = frame.batch_size;
        let (samples, surfaces) = frame.split_window(0..frame.active);

        par_zip_for(pool, samples, surfaces, batch_size, |sample, surface| {
            let level = levels
                .iter()
                .find(|(id, _)| *id == sample.water_body_id)
                .map_or(self.fallback_level, |(_, level)| *level);
            *surface = WaterSurface::flat(
                sample.position,
                level,
                self.default_depth,
                sample.water_body_id,
            );
        });
    }
}
