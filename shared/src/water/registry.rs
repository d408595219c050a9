//! Mapping from query consumers to contiguous slices of the shared sample buffer.
//!
//! Ranges are packed from the front of the buffer. Removing a query shifts every
//! range that sat behind it down by the removed length, so the claimed region is
//! always `[0, active_count)` and the free capacity lives at the tail.

use std::collections::HashMap;

use bevy_log::{debug, error, info};

use super::sample::{QueryId, QueryRange};
use crate::error::WaterError;

/// What a call to [`QueryRegistry::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Already registered with the same sample count
    Unchanged(QueryRange),
    /// Appended at the tail
    Added(QueryRange),
    /// Sample count changed: the previous range was removed and a new one appended
    Resized {
        previous: QueryRange,
        range: QueryRange,
    },
}

impl Registration {
    pub fn range(&self) -> QueryRange {
        match *self {
            Registration::Unchanged(range)
            | Registration::Added(range)
            | Registration::Resized { range, .. } => range,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryRegistry {
    entries: HashMap<QueryId, QueryRange>,
    active_count: usize,
    capacity: usize,
}

impl QueryRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            active_count: 0,
            capacity,
        }
    }

    /// Registers `count` samples for `id`.
    ///
    /// A registration that would bring the active total to the capacity or past it
    /// is rejected and leaves the registry untouched.
    pub fn add(&mut self, id: QueryId, count: usize) -> Result<Registration, WaterError> {
        if count == 0 {
            error!("Query {} requested zero samples, ignoring", id);
            return Err(WaterError::EmptyQuery(id));
        }

        let previous = self.entries.get(&id).copied();
        if let Some(range) = previous {
            if range.len() == count {
                return Ok(Registration::Unchanged(range));
            }
        }

        let freed = previous.map_or(0, |range| range.len());
        let active_after_removal = self.active_count - freed;
        if active_after_removal + count >= self.capacity {
            error!(
                "Query {} needs {} samples but only {} of {} are free, increase the buoyancy sample budget",
                id,
                count,
                self.capacity.saturating_sub(active_after_removal + 1),
                self.capacity
            );
            return Err(WaterError::CapacityExceeded {
                requested: count,
                active: active_after_removal,
                capacity: self.capacity,
            });
        }

        if let Some(previous) = previous {
            info!(
                "Query {} changed sample count ({} vs {}), re-registering",
                id,
                previous.len(),
                count
            );
            self.remove(id);
        }

        let range = QueryRange::new(self.active_count, count);
        self.entries.insert(id, range);
        self.active_count += count;
        debug!(
            "Registered query {} at {:?}, {} of {} samples active",
            id,
            range.as_range(),
            self.active_count,
            self.capacity
        );

        Ok(match previous {
            Some(previous) => Registration::Resized { previous, range },
            None => Registration::Added(range),
        })
    }

    /// Unregisters `id` and compacts every range that followed it.
    pub fn remove(&mut self, id: QueryId) -> Option<QueryRange> {
        let removed = self.entries.remove(&id)?;
        let size = removed.len();

        for range in self.entries.values_mut() {
            if range.start > removed.start {
                range.shift_down(size);
            }
        }
        self.active_count -= size;

        debug!(
            "Removed query {} ({} samples), {} of {} samples active",
            id, size, self.active_count, self.capacity
        );
        Some(removed)
    }

    pub fn range(&self, id: QueryId) -> Option<QueryRange> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: QueryId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, QueryRange)> + '_ {
        self.entries.iter().map(|(id, range)| (*id, *range))
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.active_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const A: QueryId = QueryId(1);
    const X: QueryId = QueryId(2);
    const B: QueryId = QueryId(3);

    fn assert_dense(registry: &QueryRegistry) {
        let mut ranges: Vec<QueryRange> = registry.iter().map(|(_, range)| range).collect();
        ranges.sort_by_key(|range| range.start);

        let total: usize = ranges.iter().map(QueryRange::len).sum();
        assert_eq!(total, registry.active_count());

        for pair in ranges.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
        }
    }

    #[test]
    fn test_removal_compacts_following_ranges() {
        let mut registry = QueryRegistry::new(4096);
        registry.add(A, 10).unwrap();
        registry.add(X, 5).unwrap();
        registry.add(B, 5).unwrap();
        assert_eq!(registry.range(X), Some(QueryRange { start: 10, end: 15 }));
        assert_eq!(registry.range(B), Some(QueryRange { start: 15, end: 20 }));

        assert_eq!(registry.remove(X), Some(QueryRange { start: 10, end: 15 }));

        assert_eq!(registry.range(A), Some(QueryRange { start: 0, end: 10 }));
        assert_eq!(registry.range(B), Some(QueryRange { start: 10, end: 15 }));
        assert_eq!(registry.active_count(), 15);
        assert!(!registry.contains(X));
    }

    #[test]
    fn test_add_same_count_is_noop() {
        let mut registry = QueryRegistry::new(64);
        let first = registry.add(A, 4).unwrap();
        let second = registry.add(A, 4).unwrap();
        assert_eq!(first, Registration::Added(QueryRange::new(0, 4)));
        assert_eq!(second, Registration::Unchanged(QueryRange::new(0, 4)));
        assert_eq!(registry.active_count(), 4);
    }

    #[test]
    fn test_resize_moves_query_to_tail() {
        let mut registry = QueryRegistry::new(64);
        registry.add(A, 4).unwrap();
        registry.add(B, 2).unwrap();

        let outcome = registry.add(A, 6).unwrap();
        assert_eq!(
            outcome,
            Registration::Resized {
                previous: QueryRange::new(0, 4),
                range: QueryRange::new(2, 6),
            }
        );
        assert_eq!(registry.range(B), Some(QueryRange::new(0, 2)));
        assert_eq!(registry.active_count(), 8);
        assert_dense(&registry);
    }

    #[test]
    fn test_capacity_boundary_is_rejected() {
        let mut registry = QueryRegistry::new(16);
        registry.add(A, 10).unwrap();

        // 10 + 6 reaches the capacity exactly
        let err = registry.add(B, 6).unwrap_err();
        assert_eq!(
            err,
            WaterError::CapacityExceeded {
                requested: 6,
                active: 10,
                capacity: 16
            }
        );
        assert!(!registry.contains(B));
        assert_eq!(registry.active_count(), 10);

        assert!(registry.add(B, 5).is_ok());
        assert_eq!(registry.active_count(), 15);
    }

    #[test]
    fn test_rejected_resize_keeps_previous_range() {
        let mut registry = QueryRegistry::new(16);
        registry.add(A, 4).unwrap();
        registry.add(B, 4).unwrap();

        assert!(registry.add(A, 12).is_err());
        assert_eq!(registry.range(A), Some(QueryRange::new(0, 4)));
        assert_eq!(registry.active_count(), 8);
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let mut registry = QueryRegistry::new(16);
        assert_eq!(registry.add(A, 0), Err(WaterError::EmptyQuery(A)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_random_operations_stay_dense() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = QueryRegistry::new(256);

        for _ in 0..500 {
            let id = QueryId(rng.gen_range(0..12));
            if rng.gen_bool(0.6) {
                let _ = registry.add(id, rng.gen_range(1..40));
            } else {
                registry.remove(id);
            }
            assert_dense(&registry);
            assert!(registry.active_count() < registry.capacity());
        }
    }
}
