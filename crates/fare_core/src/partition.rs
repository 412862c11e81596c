//! Groups the record stream into contiguous per-ride batches.
//!
//! The partitioner is the single producer of the pipeline. It holds at most
//! one batch at a time, so memory depends on the pool size and not on the
//! input length. Sending into the bounded work queue is the backpressure
//! point: a slow worker pool stalls the source here.

use crossbeam_channel::{SendError, Sender};
use log::{debug, warn};

use crate::batch::RideBatch;
use crate::config::MalformedRecordPolicy;
use crate::error::FareError;
use crate::pool::BufferPool;
use crate::record::PathPing;
use crate::source::RecordSource;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartitionStats {
    /// Records pulled from the source, malformed ones included.
    pub records_read: u64,
    pub records_skipped: u64,
    pub batches_published: u64,
}

pub struct Partitioner<'p> {
    pool: &'p BufferPool,
    work: Sender<RideBatch>,
    malformed_records: MalformedRecordPolicy,
}

impl<'p> Partitioner<'p> {
    pub fn new(
        pool: &'p BufferPool,
        work: Sender<RideBatch>,
        malformed_records: MalformedRecordPolicy,
    ) -> Self {
        Self {
            pool,
            work,
            malformed_records,
        }
    }

    /// Drains `source` into the work queue. The queue closes when this
    /// returns, on success or failure, because the partitioner owns the only
    /// sender.
    pub fn run<S: RecordSource + ?Sized>(self, source: &mut S) -> Result<PartitionStats, FareError> {
        let mut stats = PartitionStats::default();
        let mut in_flight: Option<RideBatch> = None;

        loop {
            let ping = match self.next_ping(source, &mut stats) {
                Ok(Some(ping)) => ping,
                Ok(None) => break,
                Err(error) => {
                    if let Some(batch) = in_flight.take() {
                        self.pool.release(batch);
                    }
                    return Err(error);
                }
            };

            match in_flight.as_mut() {
                Some(batch) if batch.ride_id() == ping.ride_id => batch.push(ping),
                _ => {
                    if let Some(done) = in_flight.take() {
                        self.publish(done, &mut stats)?;
                    }
                    let mut batch = self.pool.acquire(ping.ride_id);
                    batch.push(ping);
                    in_flight = Some(batch);
                }
            }
        }

        if let Some(done) = in_flight.take() {
            self.publish(done, &mut stats)?;
        }

        debug!(
            "partitioner done: {} records, {} skipped, {} batches",
            stats.records_read, stats.records_skipped, stats.batches_published
        );
        Ok(stats)
    }

    /// Next parseable ping, skipping malformed records when the policy allows.
    fn next_ping<S: RecordSource + ?Sized>(
        &self,
        source: &mut S,
        stats: &mut PartitionStats,
    ) -> Result<Option<PathPing>, FareError> {
        loop {
            let parsed = match source.next_record() {
                Ok(None) => return Ok(None),
                Ok(Some(record)) => record.parse(),
                Err(error) => Err(error),
            };
            match parsed {
                Ok(ping) => {
                    stats.records_read += 1;
                    return Ok(Some(ping));
                }
                Err(error) if error.is_record_error() => {
                    stats.records_read += 1;
                    if self.malformed_records == MalformedRecordPolicy::Fail {
                        return Err(error);
                    }
                    warn!("skipping malformed record: {error}");
                    stats.records_skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn publish(&self, batch: RideBatch, stats: &mut PartitionStats) -> Result<(), FareError> {
        match self.work.send(batch) {
            Ok(()) => {
                stats.batches_published += 1;
                Ok(())
            }
            Err(SendError(batch)) => {
                self.pool.release(batch);
                Err(FareError::Disconnected("work"))
            }
        }
    }
}
