use thiserror::Error;

use crate::water::{QueryId, SystemState};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaterError {
    #[error("Sample budget exceeded: {active} active samples, adding {requested} would reach the budget of {capacity}")]
    CapacityExceeded {
        requested: usize,
        active: usize,
        capacity: usize,
    },
    #[error("Query {0} requested zero samples")]
    EmptyQuery(QueryId),
    #[error("Water physics is not ready (current state: {0:?})")]
    NotReady(SystemState),
    #[error("Invalid water settings: {0}")]
    InvalidSettings(String),
}
