//! Spatial operations: coordinates and great-circle distance.

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 position in degrees. Values are not range-checked; garbage input
/// yields garbage (often NaN) distances, which the segment filter rejects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance in kilometers between two coordinates.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_are_zero_apart() {
        let athens = Coordinate::new(37.966660, 23.728308);
        assert_eq!(distance_km(athens, athens), 0.0);
    }

    #[test]
    fn one_tenth_degree_of_latitude() {
        let a = Coordinate::new(37.9, 23.7);
        let b = Coordinate::new(38.0, 23.7);
        let expected = EARTH_RADIUS_KM * 0.1_f64.to_radians();
        assert!((distance_km(a, b) - expected).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(37.966660, 23.728308);
        let b = Coordinate::new(37.966203, 23.728597);
        assert_eq!(distance_km(a, b), distance_km(b, a));
        assert!(distance_km(a, b) > 0.0);
    }

    #[test]
    fn athens_to_thessaloniki_is_about_300_km() {
        let athens = Coordinate::new(37.9838, 23.7275);
        let thessaloniki = Coordinate::new(40.6401, 22.9444);
        let km = distance_km(athens, thessaloniki);
        assert!((km - 302.0).abs() < 5.0, "got {km}");
    }
}
