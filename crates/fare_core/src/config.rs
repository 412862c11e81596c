use std::num::NonZeroUsize;
use std::thread;

use chrono::{FixedOffset, Offset, Utc};

use crate::error::FareError;

/// Cores left for the partitioner and the sink writer.
const RESERVED_CORES: usize = 1;

/// Default fare queue depth. Fares are small, so this can be generous.
const DEFAULT_FARE_QUEUE_CAPACITY: usize = 10_000;

/// Default pings per pooled batch before it reallocates.
const DEFAULT_BATCH_CAPACITY: usize = 100;

/// What the partitioner does with a record it cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedRecordPolicy {
    /// Abort the run with the parse error.
    #[default]
    Fail,
    /// Log the record, count it and carry on.
    Skip,
}

/// Sizing and behavior of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of fare workers.
    pub workers: usize,
    /// Ride batches waiting for a worker before the partitioner blocks.
    pub work_queue_capacity: usize,
    /// Priced fares waiting for the sink before workers block.
    pub fare_queue_capacity: usize,
    /// Ride batches in circulation. Caps memory independent of queue sizes.
    pub pool_size: usize,
    /// Initial ping capacity of each pooled batch.
    pub batch_capacity: usize,
    pub malformed_records: MalformedRecordPolicy,
    /// Offset used to read the time of day of a segment.
    pub utc_offset: FixedOffset,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = default_workers();
        Self {
            workers,
            work_queue_capacity: workers,
            fare_queue_capacity: DEFAULT_FARE_QUEUE_CAPACITY,
            pool_size: workers * 2,
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            malformed_records: MalformedRecordPolicy::default(),
            utc_offset: Utc.fix(),
        }
    }
}

/// Available parallelism minus the reserved cores, at least one.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .saturating_sub(RESERVED_CORES)
        .max(1)
}

impl PipelineConfig {
    /// Sets the worker count and rescales the work queue and pool to match.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.work_queue_capacity = workers;
        self.pool_size = workers * 2;
        self
    }

    pub fn with_work_queue_capacity(mut self, capacity: usize) -> Self {
        self.work_queue_capacity = capacity;
        self
    }

    pub fn with_fare_queue_capacity(mut self, capacity: usize) -> Self {
        self.fare_queue_capacity = capacity;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    pub fn with_malformed_records(mut self, policy: MalformedRecordPolicy) -> Self {
        self.malformed_records = policy;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sizes are fixed for the whole run, so a zero anywhere would stall it.
    /// The pool must also outnumber the work queue: if the workers hang up,
    /// batches still queued never return, and the partitioner needs one more
    /// to discover the hang-up instead of waiting on the pool forever.
    pub fn validate(&self) -> Result<(), FareError> {
        let sizes = [
            ("workers", self.workers),
            ("work_queue_capacity", self.work_queue_capacity),
            ("fare_queue_capacity", self.fare_queue_capacity),
            ("pool_size", self.pool_size),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(FareError::config(format!("{name} must be positive")));
            }
        }
        if self.pool_size <= self.work_queue_capacity {
            return Err(FareError::config(format!(
                "pool_size ({}) must exceed work_queue_capacity ({})",
                self.pool_size, self.work_queue_capacity
            )));
        }
        Ok(())
    }
}
