use crate::models::GeoCoordinate;

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres (spherical law of cosines)
///
/// Inputs are assumed valid. The longitude difference is reduced modulo 360°;
/// points on a shared meridian (identical points included) take the exact
/// meridian arc, and elsewhere the cosine is clamped to `acos`'s domain.
pub fn distance_km(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    distance_between(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Same as [`distance_km`] on raw degree pairs
pub fn distance_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lon_cos = (lon1 - lon2).rem_euclid(360.0).to_radians().cos();
    if lon_cos == 1.0 {
        return (lat1 - lat2).abs().to_radians() * EARTH_RADIUS_KM;
    }

    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let cosine = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * lon_cos;
    cosine.clamp(-1.0, 1.0).acos() * EARTH_RADIUS_KM
}
