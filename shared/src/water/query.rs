use super::sample::{QueryId, WaterSample, WaterSurface};

/// An object that samples the water surface through the physics scheduler.
///
/// Every frame the scheduler hands the consumer its registered slice of the
/// sample buffer to fill with world positions, then the matching slice of the
/// last completed frame's results.
pub trait WaterQuery {
    fn query_id(&self) -> QueryId;

    /// Number of samples this consumer needs every frame.
    fn query_count(&self) -> usize;

    fn is_enabled(&self) -> bool {
        true
    }

    fn set_query_positions(&mut self, samples: &mut [WaterSample]);

    fn get_query_results(&mut self, surfaces: &[WaterSurface]);
}
