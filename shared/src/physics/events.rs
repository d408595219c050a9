use bevy::math::Vec3;
use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::water::{QueryId, WaterQuery, WaterSample, WaterSurface};

/// Contact state of a point against the water surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaterEventType {
    #[default]
    None,
    Submerged,
    Entered,
    Exited,
}

/// Tracks whether a point is under the surface and reports transitions.
#[derive(Component, Debug, Clone)]
pub struct WaterEventTrigger {
    pub id: QueryId,
    pub position: Vec3,
    state: WaterEventType,
    submerged: bool,
    surface: Option<WaterSurface>,
}

/// Outcome of one state check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterEventUpdate {
    pub state: WaterEventType,
    pub previous: WaterEventType,
    pub submerged_changed: bool,
}

impl WaterEventUpdate {
    pub fn state_changed(&self) -> bool {
        self.state != self.previous
    }
}

impl WaterEventTrigger {
    pub fn new(id: QueryId, position: Vec3) -> Self {
        Self {
            id,
            position,
            state: WaterEventType::None,
            submerged: false,
            surface: None,
        }
    }

    pub fn state(&self) -> WaterEventType {
        self.state
    }

    pub fn is_submerged(&self) -> bool {
        self.submerged
    }

    /// Re-evaluates the state against the last sampled surface.
    ///
    /// The point is submerged when it lies on the back side of the surface normal.
    pub fn check_state(&mut self) -> WaterEventUpdate {
        let previous = self.state;
        let was_submerged = self.submerged;

        self.submerged = self.surface.is_some_and(|surface| {
            let facing = surface
                .normal
                .dot((self.position - surface.position).normalize_or_zero());
            facing < 0.0
        });

        self.state = match (self.submerged, was_submerged) {
            (true, true) => WaterEventType::Submerged,
            (true, false) => WaterEventType::Entered,
            (false, true) => WaterEventType::Exited,
            (false, false) => WaterEventType::None,
        };

        WaterEventUpdate {
            state: self.state,
            previous,
            submerged_changed: was_submerged != self.submerged,
        }
    }
}

impl WaterQuery for WaterEventTrigger {
    fn query_id(&self) -> QueryId {
        self.id
    }

    fn query_count(&self) -> usize {
        1
    }

    fn set_query_positions(&mut self, samples: &mut [WaterSample]) {
        if let Some(sample) = samples.first_mut() {
            sample.position = self.position;
        }
    }

    fn get_query_results(&mut self, surfaces: &[WaterSurface]) {
        self.surface = surfaces.first().copied();
    }
}
