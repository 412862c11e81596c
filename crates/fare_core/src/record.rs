//! Path records: raw source fields and the pings parsed from them.

use chrono::{DateTime, Utc};

use crate::error::FareError;
use crate::spatial::Coordinate;

pub type RideId = u64;

/// Number of fields in one path record.
pub const RECORD_FIELDS: usize = 4;

/// Field names in record order, as used in error reports.
pub const FIELD_NAMES: [&str; RECORD_FIELDS] = ["ride_id", "latitude", "longitude", "timestamp"];

/// Borrowed view of one source record: `ride_id, lat, lng, unix_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// 1-based position of the record in the source, used in error reports.
    pub position: u64,
    pub ride_id: &'a str,
    pub latitude: &'a str,
    pub longitude: &'a str,
    pub timestamp: &'a str,
}

/// One GPS observation of a ride.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPing {
    pub ride_id: RideId,
    pub position: Coordinate,
    pub timestamp: DateTime<Utc>,
}

impl PathPing {
    pub fn new(ride_id: RideId, lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            ride_id,
            position: Coordinate::new(lat, lng),
            timestamp,
        }
    }
}

impl<'a> RawRecord<'a> {
    /// Builds a record from a field slice, checking the field count.
    pub fn from_fields(position: u64, fields: &[&'a str]) -> Result<Self, FareError> {
        match *fields {
            [ride_id, latitude, longitude, timestamp] => Ok(Self {
                position,
                ride_id,
                latitude,
                longitude,
                timestamp,
            }),
            _ => Err(FareError::FieldCount {
                position,
                expected: RECORD_FIELDS,
                found: fields.len(),
            }),
        }
    }

    pub fn parse_ride_id(&self) -> Result<RideId, FareError> {
        parse_field(self.position, "ride_id", self.ride_id)
    }

    pub fn parse(&self) -> Result<PathPing, FareError> {
        let ride_id = self.parse_ride_id()?;
        let lat: f64 = parse_field(self.position, "latitude", self.latitude)?;
        let lng: f64 = parse_field(self.position, "longitude", self.longitude)?;
        let secs: i64 = parse_field(self.position, "timestamp", self.timestamp)?;
        let timestamp = DateTime::from_timestamp(secs, 0).ok_or_else(|| FareError::Parse {
            position: self.position,
            field: "timestamp",
            value: self.timestamp.to_string(),
        })?;
        Ok(PathPing::new(ride_id, lat, lng, timestamp))
    }
}

fn parse_field<T: std::str::FromStr>(
    position: u64,
    field: &'static str,
    value: &str,
) -> Result<T, FareError> {
    value.trim().parse().map_err(|_| FareError::Parse {
        position,
        field,
        value: value.to_string(),
    })
}
