//! Water physics scheduler.
//!
//! Owns the shared sample buffers, the query registry and the modifier list, and
//! drives one frame of the job graph per [`WaterPhysics::update`].
//!
//! ## Frame
//!
//! 1. Complete the previous frame's jobs, blocking if they are still running.
//! 2. Copy the write buffer into the read buffer.
//! 3. Sync registrations, reset sample ownership, let every consumer write its
//!    positions and read the previous results.
//! 4. Schedule bounds classification, the body lookup reduction, surface seeding
//!    and one job per modifier and body, then return without waiting.
//!
//! Consumers therefore always read results that are one frame old and come
//! from a fully completed frame.

use std::fmt::Write as _;
use std::sync::Arc;

use bevy::math::Vec3;
use bevy::tasks::{TaskPool, TaskPoolBuilder};
use bevy_ecs::resource::Resource;
use bevy_log::{debug, info, warn};

use super::body::{WaterBody, WaterBodyData};
use super::config::PhysicsSettings;
use super::jobs::{
    BoundsCheckJob, FrameData, JobChain, JobHandle, SurfacePrepJob, WaterBodyLookupJob,
};
use super::modifiers::{default_modifiers, DynWaterModifier};
use super::query::WaterQuery;
use super::registry::{QueryRegistry, Registration};
use super::sample::{QueryId, QueryRange, SystemState, WaterBodyId, WaterSample, WaterSurface};
use crate::error::WaterError;

#[derive(Resource)]
pub struct WaterPhysics {
    state: SystemState,
    settings: PhysicsSettings,
    pool: Arc<TaskPool>,
    registry: QueryRegistry,
    /// Buffers owned by the scheduler, `None` while a frame is in flight
    frame: Option<FrameData>,
    read_surfaces: Vec<WaterSurface>,
    handle: Option<JobHandle>,
    modifiers: Vec<Box<dyn DynWaterModifier>>,
    frame_count: u64,
}

impl WaterPhysics {
    pub fn new(settings: PhysicsSettings) -> Result<Self, WaterError> {
        let pool = TaskPoolBuilder::new()
            .thread_name("Water Physics".to_string())
            .build();
        Self::with_pool(settings, Arc::new(pool))
    }

    pub fn with_pool(settings: PhysicsSettings, pool: Arc<TaskPool>) -> Result<Self, WaterError> {
        settings.validate()?;
        Ok(Self {
            state: SystemState::None,
            registry: QueryRegistry::new(settings.buoyancy_samples),
            settings,
            pool,
            frame: None,
            read_surfaces: Vec::new(),
            handle: None,
            modifiers: Vec::new(),
            frame_count: 0,
        })
    }

    fn transition(&mut self, next: SystemState) {
        debug!("Water physics state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Allocates the sample buffers and modifiers, leaving the scheduler `Ready`.
    pub fn setup(&mut self) {
        if self.state != SystemState::None {
            warn!("Water physics setup called in state {:?}", self.state);
            return;
        }
        self.transition(SystemState::Setup);

        let capacity = self.settings.buoyancy_samples;
        self.registry = QueryRegistry::new(capacity);
        self.frame = Some(FrameData::with_capacity(capacity, self.settings.batch_size));
        self.read_surfaces = vec![self.fallback_surface(); capacity];
        self.modifiers = default_modifiers(&self.settings.modifiers);
        self.frame_count = 0;

        info!(
            "Water physics ready with {} samples and modifiers {:?}",
            capacity,
            self.modifier_names()
        );
        self.transition(SystemState::Ready);
    }

    /// Waits for in-flight jobs, then releases buffers and cached modifier data.
    pub fn cleanup(&mut self) {
        if self.state == SystemState::None {
            return;
        }
        self.transition(SystemState::Cleanup);

        if let Some(handle) = self.handle.take() {
            handle.complete();
        }
        for modifier in &mut self.modifiers {
            modifier.cleanup();
        }
        self.modifiers.clear();
        self.registry.clear();
        self.frame = None;
        self.read_surfaces = Vec::new();

        self.transition(SystemState::None);
    }

    fn ensure_ready(&self) -> Result<(), WaterError> {
        if self.state == SystemState::Ready {
            Ok(())
        } else {
            warn!("Water physics is not ready (state {:?})", self.state);
            Err(WaterError::NotReady(self.state))
        }
    }

    fn fallback_surface(&self) -> WaterSurface {
        WaterSurface::flat(
            Vec3::ZERO,
            self.settings.fallback_water_level,
            self.settings.default_depth,
            WaterBodyId::UNCLAIMED,
        )
    }

    /// Runs one frame: collects the previous results and schedules the next jobs.
    pub fn update(
        &mut self,
        time: f32,
        bodies: &[&WaterBody],
        queries: &mut [&mut dyn WaterQuery],
    ) {
        if self.ensure_ready().is_err() {
            return;
        }

        self.complete_jobs();
        self.update_sample_points(queries);
        self.schedule(time, bodies);
        self.frame_count += 1;
    }

    /// Blocks on the in-flight frame and publishes its results to the read buffer.
    pub fn complete_jobs(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let frame = handle.complete();
        let active = frame.active;
        self.read_surfaces[..active].copy_from_slice(&frame.surfaces[..active]);
        self.frame = Some(frame);
    }

    fn update_sample_points(&mut self, queries: &mut [&mut dyn WaterQuery]) {
        // Disabled queries give their slots back before anything is added
        for query in queries.iter() {
            let id = query.query_id();
            if !query.is_enabled() && self.registry.contains(id) {
                if let Some(range) = self.unregister(id) {
                    debug!("Query {} disabled, released {} samples", id, range.len());
                }
            }
        }

        for query in queries.iter() {
            if query.is_enabled() {
                // Failures are logged by the registry and the query is skipped
                let _ = self.register(query.query_id(), query.query_count());
            }
        }

        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        frame.active = self.registry.active_count();
        for sample in &mut frame.samples[..frame.active] {
            sample.water_body_id = WaterBodyId::UNCLAIMED;
        }

        for query in queries.iter_mut() {
            if !query.is_enabled() {
                continue;
            }
            let id = query.query_id();
            let Some(range) = self.registry.range(id) else {
                continue;
            };

            let samples = &mut frame.samples[range.as_range()];
            query.set_query_positions(samples);
            for sample in samples.iter_mut() {
                sample.query_id = id;
            }
            query.get_query_results(&self.read_surfaces[range.as_range()]);
        }
    }

    fn schedule(&mut self, time: f32, bodies: &[&WaterBody]) {
        let Some(mut frame) = self.frame.take() else {
            return;
        };
        frame.time = time;
        frame.bodies = bodies
            .iter()
            .map(|body| WaterBodyData::from_body(body))
            .collect();

        let mut chain = JobChain::new()
            .then(BoundsCheckJob)
            .then(WaterBodyLookupJob)
            .then(SurfacePrepJob {
                fallback_level: self.settings.fallback_water_level,
                default_depth: self.settings.default_depth,
            });
        for modifier in &mut self.modifiers {
            modifier.enqueue_jobs(&mut chain, bodies);
        }

        self.handle = Some(chain.schedule(self.pool.clone(), frame));
    }

    /// Registers `count` samples for `id`, completing any in-flight frame first.
    ///
    /// Re-registering with a different count moves the query to the tail.
    pub fn add_query(&mut self, id: QueryId, count: usize) -> Result<QueryRange, WaterError> {
        self.ensure_ready()?;
        self.complete_jobs();
        self.register(id, count)
    }

    /// Unregisters `id` and compacts the buffers behind it.
    pub fn remove_query(&mut self, id: QueryId) -> Option<QueryRange> {
        self.ensure_ready().ok()?;
        self.complete_jobs();
        self.unregister(id)
    }

    fn unregister(&mut self, id: QueryId) -> Option<QueryRange> {
        let removed = self.registry.remove(id)?;
        let tail = self.registry.active_count() + removed.len();
        self.compact(removed, tail);
        Some(removed)
    }

    fn register(&mut self, id: QueryId, count: usize) -> Result<QueryRange, WaterError> {
        match self.registry.add(id, count)? {
            Registration::Unchanged(range) => Ok(range),
            Registration::Added(range) => {
                self.reset_range(id, range);
                Ok(range)
            }
            Registration::Resized { previous, range } => {
                self.compact(previous, range.start + previous.len());
                self.reset_range(id, range);
                Ok(range)
            }
        }
    }

    /// Shifts `[removed.end, tail)` down onto `removed.start` in every buffer.
    fn compact(&mut self, removed: QueryRange, tail: usize) {
        let moved = removed.end..tail;
        if let Some(frame) = self.frame.as_mut() {
            frame.samples.copy_within(moved.clone(), removed.start);
            frame.surfaces.copy_within(moved.clone(), removed.start);
            frame.active = self.registry.active_count();
        }
        self.read_surfaces.copy_within(moved, removed.start);
    }

    fn reset_range(&mut self, id: QueryId, range: QueryRange) {
        let fallback = self.fallback_surface();
        if let Some(frame) = self.frame.as_mut() {
            frame.samples[range.as_range()].fill(WaterSample {
                query_id: id,
                ..Default::default()
            });
            frame.surfaces[range.as_range()].fill(fallback);
        }
        self.read_surfaces[range.as_range()].fill(fallback);
    }

    /// Results of the last completed frame for `id`.
    pub fn get_query_results(&self, id: QueryId) -> Option<&[WaterSurface]> {
        let range = self.registry.range(id)?;
        self.read_surfaces.get(range.as_range())
    }

    pub fn query_range(&self, id: QueryId) -> Option<QueryRange> {
        self.registry.range(id)
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn active_sample_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn query_count(&self) -> usize {
        self.registry.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether a frame is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.handle.is_some()
    }

    pub fn modifier_names(&self) -> Vec<&'static str> {
        self.modifiers.iter().map(|modifier| modifier.name()).collect()
    }

    /// Human-readable state of the scheduler.
    pub fn debug_summary(&self) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "State: {:?}", self.state);
        let _ = writeln!(
            summary,
            "Samples: {}/{} across {} queries",
            self.registry.active_count(),
            self.registry.capacity(),
            self.registry.len()
        );
        for modifier in &self.modifiers {
            let _ = writeln!(
                summary,
                "{}: {} cached datasets",
                modifier.name(),
                modifier.cached_count()
            );
        }
        let _ = write!(summary, "Frames: {}", self.frame_count);
        summary
    }
}

impl Drop for WaterPhysics {
    fn drop(&mut self) {
        self.cleanup();
    }
}
