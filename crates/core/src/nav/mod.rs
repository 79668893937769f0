//! Short-range distance math.
//!
//! Pure functions shared by the navigation arrival check and the queue's
//! spatial deduplication. Both must agree on what "distance" means, so
//! both call [`flat_distance_m`] — a small-angle planar approximation
//! that is accurate to well under a percent at the sub-kilometer ranges
//! a spray mission covers. Not geodesic; do not reuse for long legs.

use libm::sqrt;

/// Meters per degree of latitude (and of longitude at the equator).
const DEG_TO_M: f64 = 1.113195e5;

/// Horizontal distance in meters between two positions.
///
/// Treats one degree of latitude and longitude as a fixed number of
/// meters and takes the Euclidean norm. The longitude axis is not
/// cos(lat)-corrected, matching the arrival and dedup thresholds this
/// value is compared against, which were tuned with the same formula.
pub fn flat_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f32 {
    let dlat = (lat1 - lat2) * DEG_TO_M;
    let dlon = (lon1 - lon2) * DEG_TO_M;
    sqrt(dlat * dlat + dlon * dlon) as f32
}
