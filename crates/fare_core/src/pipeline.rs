//! Pipeline assembly: one producer, N workers, one sink consumer.
//!
//! ```text
//! RecordSource -> Partitioner -> [work queue] -> WorkerPool -> [fare queue] -> FareSink
//!                      ^                              |
//!                      +-------- BufferPool <---------+
//! ```
//!
//! The pool and both queues live for one call of [`run_pipeline`]. The
//! partitioner runs on its own thread, workers on theirs, and the sink is
//! drained on the calling thread so it does not need to be `Send`.

use std::thread;

use crossbeam_channel::{bounded, Receiver};
use log::info;

use crate::config::PipelineConfig;
use crate::error::FareError;
use crate::partition::{PartitionStats, Partitioner};
use crate::pool::BufferPool;
use crate::pricing::FareModel;
use crate::sink::{FareSink, RideFare};
use crate::source::RecordSource;
use crate::workers::{WorkerPool, WorkerStats};

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub records_read: u64,
    pub records_skipped: u64,
    pub batches_published: u64,
    pub rides_priced: u64,
    pub segments_priced: u64,
    pub segments_rejected: u64,
    pub fares_written: u64,
}

impl PipelineStats {
    fn new(partition: PartitionStats, workers: WorkerStats, fares_written: u64) -> Self {
        Self {
            records_read: partition.records_read,
            records_skipped: partition.records_skipped,
            batches_published: partition.batches_published,
            rides_priced: workers.rides_priced,
            segments_priced: workers.segments_priced,
            segments_rejected: workers.segments_rejected,
            fares_written,
        }
    }
}

/// Prices every ride in `source` and writes one fare per ride batch to `sink`.
///
/// Fares reach the sink in completion order. On failure the first root cause
/// is returned: a sink error wins over the hang-ups it causes upstream, and a
/// source error is reported after the fares already in flight are written.
pub fn run_pipeline<S, K>(
    source: &mut S,
    sink: &mut K,
    config: &PipelineConfig,
) -> Result<PipelineStats, FareError>
where
    S: RecordSource + Send + ?Sized,
    K: FareSink + ?Sized,
{
    config.validate()?;
    let pool = BufferPool::new(config.pool_size, config.batch_capacity)?;
    let workers = WorkerPool::new(config.workers, FareModel::new(config.utc_offset))?;

    info!(
        "starting fare pipeline: {} workers, pool of {}, work queue {}, fare queue {}",
        workers.workers(),
        pool.size(),
        config.work_queue_capacity,
        config.fare_queue_capacity
    );

    let stats = thread::scope(|scope| -> Result<PipelineStats, FareError> {
        let (work_tx, work_rx) = bounded(config.work_queue_capacity);
        let (fare_tx, fare_rx) = bounded(config.fare_queue_capacity);

        let worker_handles = workers.spawn(scope, &pool, work_rx, fare_tx)?;

        let partitioner = Partitioner::new(&pool, work_tx, config.malformed_records);
        let producer = thread::Builder::new()
            .name("partitioner".to_string())
            .spawn_scoped(scope, move || partitioner.run(source))
            .map_err(|error| {
                FareError::config(format!("failed to spawn partitioner: {error}"))
            })?;

        let sink_result = drain_fares(fare_rx, sink);

        let partition_result = join_stage(producer, "partitioner");
        let mut worker_stats = WorkerStats::default();
        let mut worker_error = None;
        for handle in worker_handles {
            match join_stage(handle, "worker") {
                Ok(stats) => worker_stats.merge(stats),
                Err(error) => {
                    worker_error.get_or_insert(error);
                }
            }
        }

        let fares_written = sink_result?;
        let partition_stats = partition_result?;
        if let Some(error) = worker_error {
            return Err(error);
        }
        Ok(PipelineStats::new(partition_stats, worker_stats, fares_written))
    })?;

    info!(
        "fare pipeline finished: {} records ({} skipped), {} rides priced, {} segments rejected",
        stats.records_read, stats.records_skipped, stats.rides_priced, stats.segments_rejected
    );
    Ok(stats)
}

/// Writes fares until every worker has hung up. Takes the receiver by value so
/// that a sink failure closes the fare queue and unblocks the workers.
fn drain_fares<K: FareSink + ?Sized>(
    fares: Receiver<RideFare>,
    sink: &mut K,
) -> Result<u64, FareError> {
    let mut written = 0;
    for fare in fares.iter() {
        sink.accept(fare)?;
        written += 1;
    }
    sink.finish()?;
    Ok(written)
}

fn join_stage<T>(
    handle: thread::ScopedJoinHandle<'_, Result<T, FareError>>,
    stage: &'static str,
) -> Result<T, FareError> {
    handle.join().map_err(|_| FareError::Panicked(stage))?
}
