//! Streaming taxi fare computation.
//!
//! GPS pings for many rides arrive as one time-ordered stream, each ride's pings
//! contiguous. The [`pipeline`] groups them into per-ride batches, prices each
//! batch on a worker pool and writes one [`RideFare`] per ride, in bounded
//! memory:
//!
//! - [`partition`]: groups the stream into ride batches (single producer)
//! - [`pool`]: fixed population of reusable batches
//! - [`workers`]: segment filtering and fare accumulation
//! - [`pricing`]: the tiered fare model
//! - [`source`] / [`sink`]: CSV adapters at both ends
//!
//! ```no_run
//! use fare_core::{run_pipeline, CsvFareSink, CsvRecordSource, PipelineConfig};
//!
//! let mut source = CsvRecordSource::new(std::io::stdin());
//! let mut sink = CsvFareSink::new(std::io::stdout());
//! let stats = run_pipeline(&mut source, &mut sink, &PipelineConfig::default())?;
//! eprintln!("{} rides priced", stats.rides_priced);
//! # Ok::<(), fare_core::FareError>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod partition;
pub mod pipeline;
pub mod pool;
pub mod pricing;
pub mod record;
pub mod segment;
pub mod sink;
pub mod source;
pub mod spatial;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
pub mod workers;

pub use config::{MalformedRecordPolicy, PipelineConfig};
pub use error::FareError;
pub use pipeline::{run_pipeline, PipelineStats};
pub use pricing::FareModel;
pub use sink::{CsvFareSink, FareSink, RideFare};
pub use source::{CsvRecordSource, RecordSource};
