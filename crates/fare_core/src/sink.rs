//! Fare sinks: where finalized ride fares go.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::FareError;
use crate::record::RideId;

/// Final fare of one ride.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideFare {
    pub ride_id: RideId,
    pub fare: f64,
}

/// Consumes fares in completion order. Rides arrive in no particular order.
pub trait FareSink {
    fn accept(&mut self, fare: RideFare) -> Result<(), FareError>;

    /// Called once after the last fare.
    fn finish(&mut self) -> Result<(), FareError> {
        Ok(())
    }
}

impl FareSink for Vec<RideFare> {
    fn accept(&mut self, fare: RideFare) -> Result<(), FareError> {
        self.push(fare);
        Ok(())
    }
}

/// Writes `ride_id,fare` lines, fare in shortest decimal form (`3.47`, `13`).
pub struct CsvFareSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvFareSink<W> {
    pub fn new(output: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(output),
        }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, FareError> {
        self.writer
            .into_inner()
            .map_err(|error| FareError::Flush(error.into_error()))
    }
}

impl<W: Write> FareSink for CsvFareSink<W> {
    fn accept(&mut self, fare: RideFare) -> Result<(), FareError> {
        self.writer
            .write_record([fare.ride_id.to_string(), fare.fare.to_string()])
            .map_err(FareError::Sink)
    }

    fn finish(&mut self) -> Result<(), FareError> {
        self.writer.flush().map_err(FareError::Flush)
    }
}
