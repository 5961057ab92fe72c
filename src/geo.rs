//! Driving-time estimation between geographic coordinates.
//!
//! Great-circle distance on a spherical Earth, divided by a fixed average
//! driving speed. A cheap stand-in for a routing API: good enough to rank
//! candidate workers by travel effort, not good enough for turn-by-turn ETAs.

/// Average driving speed assumed between sites (km/h).
pub const DEFAULT_DRIVING_SPEED_KMH: f64 = 20.0;

/// Mean Earth radius (km).
pub const DEFAULT_EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
///
/// Spherical law of cosines with the cosine clamped to 1 so that
/// numerically-identical coordinates never produce a NaN from `acos`.
pub fn distance_km(
    latitude1: f64,
    longitude1: f64,
    latitude2: f64,
    longitude2: f64,
    earth_radius_km: f64,
) -> f64 {
    let lat1 = latitude1.to_radians();
    let lat2 = latitude2.to_radians();
    let lon_diff = (longitude1 - longitude2).to_radians();

    let mut cos_angle = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * lon_diff.cos();
    if cos_angle > 1.0 {
        cos_angle = 1.0;
    }

    cos_angle.acos() * earth_radius_km
}

/// Estimated driving time between two points, in hours.
///
/// Returns a non-negative value; zero means the points are co-located.
pub fn driving_time_hours(
    latitude1: f64,
    longitude1: f64,
    latitude2: f64,
    longitude2: f64,
    earth_radius_km: f64,
    driving_speed_kmh: f64,
) -> f64 {
    distance_km(latitude1, longitude1, latitude2, longitude2, earth_radius_km) / driving_speed_kmh
}
