//! Fixed population of reusable ride batches.
//!
//! The pool is filled once at construction and never grows: `acquire` blocks
//! until a batch comes back, which caps the number of batches in flight no
//! matter how the queues are sized.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::warn;

use crate::batch::RideBatch;
use crate::error::FareError;
use crate::record::RideId;

pub struct BufferPool {
    free: Receiver<RideBatch>,
    returns: Sender<RideBatch>,
    size: usize,
}

impl BufferPool {
    /// Creates `size` batches, each able to hold `batch_capacity` pings
    /// before reallocating.
    pub fn new(size: usize, batch_capacity: usize) -> Result<Self, FareError> {
        if size == 0 {
            return Err(FareError::config("pool size must be positive"));
        }
        let (returns, free) = bounded(size);
        for _ in 0..size {
            returns
                .try_send(RideBatch::with_capacity(batch_capacity))
                .map_err(|_| FareError::config("pool channel rejected initial fill"))?;
        }
        Ok(Self {
            free,
            returns,
            size,
        })
    }

    /// Number of batches this pool created. Constant for its lifetime.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of batches currently idle in the pool.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Takes an idle batch, blocking until one is released, and resets it for
    /// `ride_id`.
    pub fn acquire(&self, ride_id: RideId) -> RideBatch {
        // The pool holds a sender itself, so the channel never disconnects.
        let mut batch = match self.free.recv() {
            Ok(batch) => batch,
            Err(_) => unreachable!("pool owns both channel ends"),
        };
        batch.reset(ride_id);
        batch
    }

    /// Returns a batch to the pool without blocking.
    pub fn release(&self, batch: RideBatch) {
        match self.returns.try_send(batch) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                // Only batches created by this pool may be released here.
                warn!("dropping batch released into a full pool");
            }
            Err(TrySendError::Disconnected(_)) => unreachable!("pool owns both channel ends"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use chrono::DateTime;

    use super::*;
    use crate::record::PathPing;

    #[test]
    fn rejects_empty_pool() {
        assert!(matches!(BufferPool::new(0, 10), Err(FareError::Config(_))));
    }

    #[test]
    fn acquired_batches_are_empty_with_capacity() {
        let pool = BufferPool::new(2, 16).expect("pool");
        let batch = pool.acquire(42);
        assert!(batch.is_empty());
        assert_eq!(batch.ride_id(), 42);
        assert!(batch.capacity() >= 16);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn released_batch_is_reused_cleared() {
        let pool = BufferPool::new(1, 4).expect("pool");
        let mut batch = pool.acquire(1);
        for secs in 0..10 {
            batch.push(PathPing::new(1, 0.0, 0.0, DateTime::from_timestamp(secs, 0).unwrap()));
        }
        let capacity = batch.capacity();
        pool.release(batch);

        let batch = pool.acquire(2);
        assert!(batch.is_empty());
        assert_eq!(batch.ride_id(), 2);
        assert_eq!(batch.capacity(), capacity);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn acquire_blocks_until_release() {
        let pool = BufferPool::new(1, 4).expect("pool");
        let held = pool.acquire(1);

        thread::scope(|scope| {
            let waiter = scope.spawn(|| pool.acquire(2).ride_id());
            thread::sleep(Duration::from_millis(50));
            assert!(!waiter.is_finished(), "acquire should block on an empty pool");

            pool.release(held);
            assert_eq!(waiter.join().expect("waiter thread"), 2);
        });
    }
}
