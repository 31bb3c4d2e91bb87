//! Great-circle distances between track points.

const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.1515;
const KM_PER_STATUTE_MILE: f64 = 1.609344;
const ARC_MINUTES_PER_DEGREE: f64 = 60.0;

/// Distance in kilometers between two lat/lon pairs (degrees).
///
/// Spherical law of cosines; the cosine is clamped so rounding on
/// identical points cannot push it past 1 and yield NaN.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let rad_lat1 = lat1.to_radians();
    let rad_lat2 = lat2.to_radians();
    let rad_theta = (lon1 - lon2).to_radians();

    let cos_angle = rad_lat1.sin() * rad_lat2.sin()
        + rad_lat1.cos() * rad_lat2.cos() * rad_theta.cos();

    let degrees = cos_angle.clamp(-1.0, 1.0).acos().to_degrees();
    degrees * ARC_MINUTES_PER_DEGREE * STATUTE_MILES_PER_NAUTICAL_MILE * KM_PER_STATUTE_MILE
}
