//! Per-body modifiers and their content-addressed job data cache.
//!
//! A modifier turns a water body's authored settings into immutable job data
//! and enqueues a job that rewrites the surfaces of the samples that body
//! claimed. Job data is rebuilt only when the content hash of the authored
//! settings changes; the previous data is released at that point.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::tasks::TaskPool;
use bevy_log::debug;

use super::body::WaterBody;
use super::config::ModifierToggles;
use super::hash::{ContentHash, ModifierData};
use super::jobs::{par_zip_for, FrameData, FrameJob, JobChain};
use super::sample::{WaterBodyId, WaterSample, WaterSurface};

pub mod depth;
pub mod flow;
pub mod gerstner;

pub use depth::{DepthJobData, DepthModifier};
pub use flow::FlowModifier;
pub use gerstner::{GerstnerJobData, GerstnerWaves};

/// A physics effect applied to the samples of each water body that carries its data.
pub trait WaterModifier: Send + Sync + 'static {
    /// Authored settings read from the water body
    type Data: ModifierData;
    /// Immutable data shared with the jobs
    type JobData: Send + Sync + 'static;

    const NAME: &'static str;

    fn data(body: &WaterBody) -> Option<&Self::Data>;

    fn build_job_data(&self, data: &Self::Data) -> Self::JobData;

    fn job(&self, body: WaterBodyId, data: Arc<Self::JobData>) -> Box<dyn FrameJob>;
}

/// Cached job data together with the hash of the settings it was built from.
struct DataHashSet<J> {
    hash: ContentHash,
    data: Arc<J>,
}

/// Wraps a modifier with its per-body job data cache.
pub struct ModifierSystem<M: WaterModifier> {
    modifier: M,
    cache: HashMap<WaterBodyId, DataHashSet<M::JobData>>,
    rebuilds: usize,
}

impl<M: WaterModifier> ModifierSystem<M> {
    pub fn new(modifier: M) -> Self {
        Self {
            modifier,
            cache: HashMap::new(),
            rebuilds: 0,
        }
    }

    /// Job data for `body`, rebuilt only when its settings changed.
    pub fn job_data(&mut self, body: &WaterBody) -> Option<Arc<M::JobData>> {
        let settings = M::data(body)?;
        let hash = settings.content_hash();

        if let Some(set) = self.cache.get(&body.id) {
            if set.hash == hash {
                return Some(set.data.clone());
            }
        }

        debug!(
            "Rebuilding {} data for water body {:?} (hash {})",
            M::NAME,
            body.id,
            hash
        );
        let data = Arc::new(self.modifier.build_job_data(settings));
        self.rebuilds += 1;
        // Replacing the entry releases the stale data once in-flight jobs drop it
        self.cache.insert(
            body.id,
            DataHashSet {
                hash,
                data: data.clone(),
            },
        );
        Some(data)
    }

    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}

/// Object-safe view of a [`ModifierSystem`], so the scheduler can hold a list of them.
pub trait DynWaterModifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Appends one job per live body that carries this modifier's data.
    fn enqueue_jobs(&mut self, chain: &mut JobChain, bodies: &[&WaterBody]);

    fn cached_hash(&self, body: WaterBodyId) -> Option<ContentHash>;

    fn cached_count(&self) -> usize;

    fn cleanup(&mut self);
}

impl<M: WaterModifier> DynWaterModifier for ModifierSystem<M> {
    fn name(&self) -> &'static str {
        M::NAME
    }

    fn enqueue_jobs(&mut self, chain: &mut JobChain, bodies: &[&WaterBody]) {
        // Drop data of bodies that went away
        self.cache
            .retain(|id, _| bodies.iter().any(|body| body.id == *id));

        for body in bodies.iter().filter(|body| body.enabled && body.id.is_claimed()) {
            if let Some(data) = self.job_data(body) {
                chain.push_boxed(self.modifier.job(body.id, data));
            }
        }
    }

    fn cached_hash(&self, body: WaterBodyId) -> Option<ContentHash> {
        self.cache.get(&body).map(|set| set.hash)
    }

    fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn cleanup(&mut self) {
        if !self.cache.is_empty() {
            debug!("Releasing {} cached {} datasets", self.cache.len(), M::NAME);
        }
        self.cache.clear();
    }
}

/// Modifiers enabled by `toggles`, in execution order.
///
/// Depth runs first so the wave job sees the shoreline opacity.
pub fn default_modifiers(toggles: &ModifierToggles) -> Vec<Box<dyn DynWaterModifier>> {
    let mut modifiers: Vec<Box<dyn DynWaterModifier>> = Vec::new();
    if toggles.depth {
        modifiers.push(Box::new(ModifierSystem::new(DepthModifier)));
    }
    if toggles.waves {
        modifiers.push(Box::new(ModifierSystem::new(GerstnerWaves)));
    }
    if toggles.flow {
        modifiers.push(Box::new(ModifierSystem::new(FlowModifier)));
    }
    modifiers
}

/// Runs `f` over the samples `body` claimed, in parallel.
///
/// The lookup window only bounds the iteration; samples of other bodies can sit
/// inside it, so ownership is checked per sample.
pub(crate) fn for_body_samples<F>(frame: &mut FrameData, pool: &TaskPool, body: WaterBodyId, f: F)
where
    F: Fn(&WaterSample, &mut WaterSurface) + Send + Sync,
{
    let window = frame.body_window(body);
    if window.is_empty() {
        return;
    }
    let batch_size = frame.batch_size;
    let (samples, surfaces) = frame.split_window(window);
    par_zip_for(pool, samples, surfaces, batch_size, |sample, surface| {
        if sample.water_body_id == body {
            f(sample, surface);
        }
    });
}
