pub mod constants;
pub mod error;
pub mod physics;
pub mod water;

pub use constants::*;
pub use error::WaterError;
