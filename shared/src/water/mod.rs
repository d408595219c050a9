//! Water physics and wave sampling.
//!
//! Query consumers (floats, voxel bodies, probes) ask for the water surface at
//! a set of points every frame. The [`WaterPhysics`] scheduler batches every
//! request into one shared buffer and resolves it with a parallel job graph.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  positions   ┌─────────────────────────────────────────┐
//! │ WaterQuery   │ ───────────▶ │ WaterPhysics                             │
//! │ consumers    │              │  QueryRegistry ─ sample ranges           │
//! │              │ ◀─────────── │  read buffer (last completed frame)      │
//! └──────────────┘   results    └──────────────────┬──────────────────────┘
//!                                                   │ frame buffers moved in
//!                                                   ▼
//!                 ┌─────────────────────────────────────────────────────────┐
//!                 │ JobChain on the task pool                                │
//!                 │  BoundsCheck ▶ WaterBodyLookup ▶ SurfacePrep             │
//!                 │  ▶ Depth ▶ GerstnerWaves ▶ Flow (per water body)         │
//!                 └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data flow
//!
//! - Samples outside every water body keep id 0 and get a flat surface at the
//!   fallback level.
//! - Modifier job data is cached per body and rebuilt when the content hash of
//!   the authored settings changes.
//! - Results reach consumers one frame after their positions were submitted.

pub mod body;
pub mod config;
pub mod depth;
pub mod gerstner;
pub mod hash;
pub mod jobs;
pub mod modifiers;
pub mod physics;
pub mod query;
pub mod registry;
pub mod sample;
pub mod waves;

pub use body::{ModifierSettings, ShapeKind, WaterBody, WaterBodyData, WaterShape};
pub use config::{
    BasicWaves, DepthSettings, FlowSettings, ModifierToggles, PhysicsSettings, Wave, WavePreset,
    WaveSettings, WaveType,
};
pub use depth::{depth_opacity, DepthMap, DepthProfile, DepthSampler, DepthSource};
pub use gerstner::{height_field, HeightSample};
pub use hash::{ContentHash, ContentHasher, ModifierData};
pub use physics::WaterPhysics;
pub use query::WaterQuery;
pub use registry::{QueryRegistry, Registration};
pub use sample::{QueryId, QueryRange, SystemState, WaterBodyId, WaterSample, WaterSurface};
pub use waves::generate_waves;
