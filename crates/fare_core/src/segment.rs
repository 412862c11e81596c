//! Segments between consecutive pings of a ride.

use chrono::{DateTime, Utc};

use crate::record::PathPing;
use crate::spatial::distance_km;

/// Speeds above this are GPS glitches, not driving.
pub const MAX_SANE_SPEED_KMH: f64 = 100.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub speed_kmh: f64,
    /// Start instant; its local time of day selects the distance rate.
    pub started_at: DateTime<Utc>,
}

impl Segment {
    /// Measures the segment from `from` to `to`. Non-positive durations give
    /// infinite or NaN speeds and are caught by [`Segment::is_plausible`].
    pub fn between(from: &PathPing, to: &PathPing) -> Self {
        let elapsed = to.timestamp - from.timestamp;
        let duration_hours = elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR;
        let distance_km = distance_km(from.position, to.position);
        Self {
            distance_km,
            duration_hours,
            speed_kmh: distance_km / duration_hours,
            started_at: from.timestamp,
        }
    }

    /// A segment can be priced only if time moved forward and the implied
    /// speed is finite and at most [`MAX_SANE_SPEED_KMH`].
    pub fn is_plausible(&self) -> bool {
        self.duration_hours > 0.0 && self.speed_kmh <= MAX_SANE_SPEED_KMH
    }
}
