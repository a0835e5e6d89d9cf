//! Great-circle distance and radius matching.
//!
//! Haversine over a spherical Earth, double precision throughout — the
//! matching radius is 3 meters, so the trigonometry has to stay stable at
//! sub-5-meter separations.

use serde::{Deserialize, Serialize};

use crate::constants::geofence::EARTH_RADIUS_M;

/// A GPS fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance in meters between two fixes.
///
/// Symmetric, zero for identical points, monotonically increasing with
/// angular separation.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Index and distance of the nearest candidate strictly within `radius_m`.
///
/// Distance ties fall to the earlier index, so two plants registered at the
/// exact same spot resolve to the first-registered one.
pub fn nearest_within<I>(fix: GeoPoint, candidates: I, radius_m: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = GeoPoint>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in candidates.into_iter().enumerate() {
        let d = distance_meters(fix, c);
        if d < radius_m && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best
}
