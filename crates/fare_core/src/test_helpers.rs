//! Test helpers for building pings, batches and synthetic path files.

use chrono::DateTime;

use crate::batch::RideBatch;
use crate::record::{PathPing, RideId};

/// 2014-07-17T00:00:00Z.
pub const TEST_MIDNIGHT: i64 = 1_405_555_200;

/// 2014-07-17T12:00:00Z, outside the early window.
pub const TEST_NOON: i64 = TEST_MIDNIGHT + 12 * 3600;

/// Builds a ping from unix seconds.
///
/// # Panics
///
/// Panics if `secs` is outside chrono's representable range.
pub fn ping(ride_id: RideId, lat: f64, lng: f64, secs: i64) -> PathPing {
    let timestamp = DateTime::from_timestamp(secs, 0).expect("timestamp in range");
    PathPing::new(ride_id, lat, lng, timestamp)
}

/// Builds a batch from `(lat, lng, unix_seconds)` triples.
pub fn batch_of(ride_id: RideId, points: &[(f64, f64, i64)]) -> RideBatch {
    let mut batch = RideBatch::with_capacity(points.len());
    batch.reset(ride_id);
    for &(lat, lng, secs) in points {
        batch.push(ping(ride_id, lat, lng, secs));
    }
    batch
}

/// Headerless path CSV with `rides` contiguous rides of `pings_per_ride` pings.
///
/// Rides drive north at roughly 36 km/h with a ping every 10 seconds, so every
/// segment is plausible and billed by distance.
pub fn synthetic_paths(rides: u64, pings_per_ride: u64) -> String {
    let mut csv = String::new();
    for ride in 1..=rides {
        let start = TEST_NOON + (ride as i64) * 60;
        let lng = 23.7 + (ride % 100) as f64 * 0.001;
        for step in 0..pings_per_ride {
            let lat = 37.9 + step as f64 * 0.0009;
            let secs = start + step as i64 * 10;
            csv.push_str(&format!("{ride},{lat:.6},{lng:.6},{secs}\n"));
        }
    }
    csv
}
