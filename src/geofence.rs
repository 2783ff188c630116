use crate::model::settings::GeoPoint;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates via the Haversine formula.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Whether `point` lies inside the circular fence around `center`.
/// The boundary itself counts as inside.
pub fn is_within_geofence(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    distance_meters(point, center) <= radius_meters
}

/// A fix with no reported accuracy is never sufficient.
pub fn has_sufficient_accuracy(accuracy_meters: Option<f64>, required_meters: f64) -> bool {
    match accuracy_meters {
        Some(a) => a <= required_meters,
        None => false,
    }
}
