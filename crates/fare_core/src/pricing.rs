//! Tiered taxi fare model.
//!
//! A ride is priced segment by segment:
//!
//! - segments at or below [`IDLE_SPEED_THRESHOLD_KMH`] are billed by time at
//!   [`IDLE_RATE_PER_HOUR`];
//! - moving segments are billed by distance, at [`EARLY_RATE_PER_KM`] when they
//!   start in the early window (00:00:00, 05:00:00] and [`NORMAL_RATE_PER_KM`]
//!   otherwise.
//!
//! The accumulated amount then gets the flag fare, the minimum fare floor and a
//! single round-up to the cent in [`FareModel::ride_fare`].

use chrono::{FixedOffset, NaiveTime, Offset, Timelike, Utc};

use crate::segment::Segment;

/// Hourly charge for idle segments.
pub const IDLE_RATE_PER_HOUR: f64 = 11.90;

/// Per-kilometer rate inside the early window.
pub const EARLY_RATE_PER_KM: f64 = 1.30;

/// Per-kilometer rate outside the early window.
pub const NORMAL_RATE_PER_KM: f64 = 0.74;

/// Speed up to which a segment counts as idle.
pub const IDLE_SPEED_THRESHOLD_KMH: f64 = 10.0;

/// Flat charge added to every ride.
pub const FLAG_FARE: f64 = 1.30;

/// Floor for a ride's total.
pub const MINIMUM_FARE: f64 = 3.47;

/// Last second of the early window, inclusive.
const EARLY_WINDOW_END_SECS: u32 = 5 * 3600;

/// Prices segments and finalizes rides. Time of day is read as wall-clock time
/// at `utc_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareModel {
    utc_offset: FixedOffset,
}

impl Default for FareModel {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl FareModel {
    pub fn new(utc_offset: FixedOffset) -> Self {
        Self { utc_offset }
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    /// Cost of one plausible segment. Zero-duration segments must be filtered
    /// out before they get here.
    pub fn segment_fare(&self, segment: &Segment) -> f64 {
        if segment.speed_kmh <= IDLE_SPEED_THRESHOLD_KMH {
            return IDLE_RATE_PER_HOUR * segment.duration_hours;
        }

        let local = segment.started_at.with_timezone(&self.utc_offset).time();
        if is_early(local) {
            EARLY_RATE_PER_KM * segment.distance_km
        } else {
            NORMAL_RATE_PER_KM * segment.distance_km
        }
    }

    /// Total for a ride from the sum of its segment fares.
    pub fn ride_fare(&self, segments_fare: f64) -> f64 {
        round_up_to_cent((segments_fare + FLAG_FARE).max(MINIMUM_FARE))
    }
}

/// True for times strictly after midnight up to and including 05:00:00.
/// Sub-second precision is ignored.
fn is_early(time: NaiveTime) -> bool {
    let secs = time.num_seconds_from_midnight();
    secs > 0 && secs <= EARLY_WINDOW_END_SECS
}

/// Ceiling at two decimals; riders never gain from fractional cents.
pub fn round_up_to_cent(amount: f64) -> f64 {
    (amount * 100.0).ceil() / 100.0
}
