use tracker_api::Coordinates;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance between points and along ordered paths, in kilometers.
///
/// Implementations are pure: no clock, no store, same input → same output.
pub trait DistanceEstimator: Send + Sync {
    /// Distance between two points.
    fn distance(&self, from: Coordinates, to: Coordinates) -> f64;

    /// Sum of `distance` over consecutive pairs. Fewer than two points → `0.0`.
    fn path_distance(&self, points: &[Coordinates]) -> f64;
}

/// Great-circle distance via the haversine formula.
///
/// Every pairwise distance is rounded to 3 decimals, and so is the
/// accumulated path sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceEstimator for Haversine {
    fn distance(&self, from: Coordinates, to: Coordinates) -> f64 {
        // abs(): sin² is even, and this keeps distance(a, b) == distance(b, a) bit for bit
        let delta_lat = (to.latitude - from.latitude).abs().to_radians();
        let delta_lon = (to.longitude - from.longitude).abs().to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + from.latitude.to_radians().cos()
                * to.latitude.to_radians().cos()
                * (delta_lon / 2.0).sin().powi(2);
        // near-antipodal points can push `a` an ulp past 1
        let a = a.min(1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        round_millis(EARTH_RADIUS_KM * c)
    }

    fn path_distance(&self, points: &[Coordinates]) -> f64 {
        let total: f64 = points
            .windows(2)
            .map(|pair| self.distance(pair[0], pair[1]))
            .sum();
        round_millis(total)
    }
}

/// Round half away from zero on the third decimal.
fn round_millis(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}
