use crate::record::{PathPing, RideId};

/// Reusable container for the contiguous pings of one ride.
///
/// Batches only move by value: the partitioner fills one, the work queue
/// carries it, a worker drains it and hands it back to the pool.
#[derive(Debug)]
pub struct RideBatch {
    ride_id: RideId,
    pings: Vec<PathPing>,
}

impl RideBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ride_id: 0,
            pings: Vec::with_capacity(capacity),
        }
    }

    /// Empties the batch for `ride_id`, keeping its allocation.
    pub fn reset(&mut self, ride_id: RideId) {
        self.ride_id = ride_id;
        self.pings.clear();
    }

    pub fn push(&mut self, ping: PathPing) {
        debug_assert_eq!(
            ping.ride_id, self.ride_id,
            "batch must only hold pings of its own ride"
        );
        self.pings.push(ping);
    }

    pub fn ride_id(&self) -> RideId {
        self.ride_id
    }

    pub fn pings(&self) -> &[PathPing] {
        &self.pings
    }

    pub fn len(&self) -> usize {
        self.pings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pings.capacity()
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    #[test]
    fn reset_keeps_capacity() {
        let mut batch = RideBatch::with_capacity(8);
        batch.reset(4);
        for secs in 0..20 {
            batch.push(PathPing::new(4, 1.0, 2.0, DateTime::from_timestamp(secs, 0).unwrap()));
        }
        let grown = batch.capacity();
        assert!(grown >= 20);

        batch.reset(5);
        assert!(batch.is_empty());
        assert_eq!(batch.ride_id(), 5);
        assert_eq!(batch.capacity(), grown);
    }
}
