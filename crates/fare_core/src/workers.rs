//! Fare workers: turn ride batches into fares.
//!
//! Each worker owns a batch from the moment it leaves the work queue until it
//! goes back to the pool, so segment order inside a ride is always the arrival
//! order. Across rides, fares come out in completion order.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace};

use crate::batch::RideBatch;
use crate::error::FareError;
use crate::pool::BufferPool;
use crate::pricing::FareModel;
use crate::segment::Segment;
use crate::sink::RideFare;

/// Per-worker counters, summed by the pipeline once workers are joined.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub rides_priced: u64,
    pub segments_priced: u64,
    pub segments_rejected: u64,
}

impl WorkerStats {
    pub fn merge(&mut self, other: WorkerStats) {
        self.rides_priced += other.rides_priced;
        self.segments_priced += other.segments_priced;
        self.segments_rejected += other.segments_rejected;
    }
}

/// Prices one ride.
///
/// The first ping anchors the first segment. A segment that fails
/// [`Segment::is_plausible`] is a GPS glitch: its end ping is dropped and the
/// anchor stays on the last good ping, so the next segment spans the glitch.
pub fn price_batch(batch: &RideBatch, model: &FareModel, stats: &mut WorkerStats) -> RideFare {
    let mut segments_fare = 0.0;
    let mut pings = batch.pings().iter();

    if let Some(mut anchor) = pings.next() {
        for ping in pings {
            let segment = Segment::between(anchor, ping);
            if !segment.is_plausible() {
                trace!(
                    "ride {}: rejecting segment at {} ({} km/h over {} h)",
                    batch.ride_id(),
                    ping.timestamp,
                    segment.speed_kmh,
                    segment.duration_hours
                );
                stats.segments_rejected += 1;
                continue;
            }
            segments_fare += model.segment_fare(&segment);
            stats.segments_priced += 1;
            anchor = ping;
        }
    }

    stats.rides_priced += 1;
    RideFare {
        ride_id: batch.ride_id(),
        fare: model.ride_fare(segments_fare),
    }
}

/// A fixed set of identical fare workers.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    model: FareModel,
}

impl WorkerPool {
    pub fn new(workers: usize, model: FareModel) -> Result<Self, FareError> {
        if workers == 0 {
            return Err(FareError::config("workers must be positive"));
        }
        Ok(Self { workers, model })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawns the workers into `scope`. Each one holds a clone of `fares`, so
    /// the fare queue closes once the last worker exits.
    pub fn spawn<'scope, 'env>(
        &self,
        scope: &'scope thread::Scope<'scope, 'env>,
        pool: &'env BufferPool,
        work: Receiver<RideBatch>,
        fares: Sender<RideFare>,
    ) -> Result<Vec<WorkerHandle<'scope>>, FareError> {
        (0..self.workers)
            .map(|index| {
                let work = work.clone();
                let fares = fares.clone();
                let model = self.model;
                thread::Builder::new()
                    .name(format!("fare-worker-{index}"))
                    .spawn_scoped(scope, move || run_worker(index, &model, pool, work, fares))
                    .map_err(|error| {
                        FareError::config(format!("failed to spawn worker {index}: {error}"))
                    })
            })
            .collect()
    }
}

pub type WorkerHandle<'scope> = thread::ScopedJoinHandle<'scope, Result<WorkerStats, FareError>>;

/// Worker loop: runs until the work queue is closed and drained, or until the
/// fare queue hangs up.
fn run_worker(
    index: usize,
    model: &FareModel,
    pool: &BufferPool,
    work: Receiver<RideBatch>,
    fares: Sender<RideFare>,
) -> Result<WorkerStats, FareError> {
    let mut stats = WorkerStats::default();

    for batch in work.iter() {
        let fare = price_batch(&batch, model, &mut stats);
        debug!(
            "worker {index}: ride {} priced at {} from {} pings",
            fare.ride_id,
            fare.fare,
            batch.len()
        );
        let sent = fares.send(fare);
        pool.release(batch);
        if sent.is_err() {
            return Err(FareError::Disconnected("fare"));
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;
    use crate::pricing::{FLAG_FARE, IDLE_RATE_PER_HOUR, MINIMUM_FARE, NORMAL_RATE_PER_KM};
    use crate::spatial::{distance_km, Coordinate};
    use crate::test_helpers::{batch_of, ping, TEST_NOON as NOON};

    #[test]
    fn single_ping_costs_minimum_fare() {
        let mut stats = WorkerStats::default();
        let batch = batch_of(5, &[(37.9, 23.7, NOON)]);
        let fare = price_batch(&batch, &FareModel::default(), &mut stats);

        assert_eq!(
            fare,
            RideFare {
                ride_id: 5,
                fare: MINIMUM_FARE
            }
        );
        assert_eq!(stats.segments_priced, 0);
        assert_eq!(stats.rides_priced, 1);
    }

    #[test]
    fn idle_ride_is_billed_by_time() {
        // Twenty minutes standing still.
        let batch = batch_of(1, &[(37.9, 23.7, NOON), (37.9, 23.7, NOON + 1200)]);
        let mut stats = WorkerStats::default();
        let fare = price_batch(&batch, &FareModel::default(), &mut stats);

        let expected = ((IDLE_RATE_PER_HOUR / 3.0 + FLAG_FARE) * 100.0).ceil() / 100.0;
        assert_eq!(fare.fare, expected);
        assert_eq!(fare.fare, 5.27);
    }

    #[test]
    fn moving_ride_is_billed_by_distance() {
        // 0.1 degrees north in 30 minutes, about 22 km/h.
        let batch = batch_of(1, &[(37.9, 23.7, NOON), (38.0, 23.7, NOON + 1800)]);
        let mut stats = WorkerStats::default();
        let fare = price_batch(&batch, &FareModel::default(), &mut stats);

        assert_eq!(fare.fare, 9.53);
        assert_eq!(stats.segments_priced, 1);
    }

    #[test]
    fn glitch_does_not_advance_the_anchor() {
        let p1 = (37.9, 23.7, NOON);
        // A jump of several degrees in one second.
        let p2 = (45.0, 30.0, NOON + 1);
        let p3 = (38.0, 23.7, NOON + 1800);
        let batch = batch_of(1, &[p1, p2, p3]);
        let mut stats = WorkerStats::default();
        let fare = price_batch(&batch, &FareModel::default(), &mut stats);

        assert_eq!(stats.segments_rejected, 1);
        assert_eq!(stats.segments_priced, 1);

        let p1_to_p3 = distance_km(Coordinate::new(p1.0, p1.1), Coordinate::new(p3.0, p3.1));
        let expected = ((NORMAL_RATE_PER_KM * p1_to_p3 + FLAG_FARE) * 100.0).ceil() / 100.0;
        assert_eq!(fare.fare, expected);
        assert_eq!(fare.fare, 9.53);
    }

    #[test]
    fn repeated_timestamp_is_rejected_not_priced() {
        let batch = batch_of(
            1,
            &[(37.9, 23.7, NOON), (37.95, 23.7, NOON), (38.0, 23.7, NOON + 1800)],
        );
        let mut stats = WorkerStats::default();
        let fare = price_batch(&batch, &FareModel::default(), &mut stats);

        assert_eq!(stats.segments_rejected, 1);
        assert_eq!(fare.fare, 9.53);
    }

    #[test]
    fn rejects_zero_workers() {
        assert!(WorkerPool::new(0, FareModel::default()).is_err());
    }

    #[test]
    fn workers_drain_queue_and_return_batches() {
        let pool = BufferPool::new(3, 4).unwrap();
        let (work_tx, work_rx) = bounded(3);
        let (fare_tx, fare_rx) = bounded(3);

        for ride_id in 1..=3 {
            let mut batch = pool.acquire(ride_id);
            batch.push(ping(ride_id, 37.9, 23.7, NOON));
            work_tx.send(batch).unwrap();
        }
        drop(work_tx);

        let workers = WorkerPool::new(2, FareModel::default()).unwrap();
        let mut total = WorkerStats::default();
        thread::scope(|scope| {
            let handles = workers
                .spawn(scope, &pool, work_rx, fare_tx)
                .expect("workers should spawn");
            for handle in handles {
                total.merge(handle.join().unwrap().unwrap());
            }
        });

        let mut rides: Vec<_> = fare_rx.iter().map(|fare| fare.ride_id).collect();
        rides.sort_unstable();
        assert_eq!(rides, vec![1, 2, 3]);
        assert_eq!(total.rides_priced, 3);
        assert_eq!(pool.available(), 3);
    }
}
