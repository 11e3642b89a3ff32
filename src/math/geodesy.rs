use super::Point2d;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The mean radius of the spherical Earth approximation, in m.
pub const EARTH_RADIUS: f64 = 6_371_000.0;

/// A WGS84-like coordinate in decimal degrees.
///
/// No range validation is performed; out-of-range values simply produce
/// meaningless distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new point.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// The point in degree-space, for planar interpolation.
    pub fn to_planar(self) -> Point2d {
        Point2d::new(self.lat, self.lon)
    }

    /// The inverse of [GeoPoint::to_planar].
    pub fn from_planar(point: Point2d) -> Self {
        Self::new(point.x, point.y)
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lat, point.lon]
    }
}

/// The haversine great-circle distance between two points, in m.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // `h` can creep past 1 through rounding for antipodal points
    2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
}

/// The sum of the distances between consecutive points, in m.
pub fn route_length(points: &[GeoPoint]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| distance(*a, *b))
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    fn random_point(rng: &mut impl Rng) -> GeoPoint {
        GeoPoint::new(rng.gen_range(-80.0..80.0), rng.gen_range(-180.0..180.0))
    }

    #[test]
    fn distance_is_symmetric() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Haversine is not a fruit, sadly.");
        for _i in 0..100 {
            let a = random_point(&mut rng);
            let b = random_point(&mut rng);
            assert_eq!(distance(a, b), distance(b, a));
            assert_eq!(distance(a, a), 0.0);
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint::new(29.0, -110.95);
        let b = GeoPoint::new(30.0, -110.95);
        let d = distance(a, b);
        assert!((d - 111_000.0).abs() < 1_110.0, "got {d} m");
    }

    #[test]
    fn length_is_additive() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Cumulative sums, twenty per go..");
        let points = (0..20)
            .map(|_| GeoPoint::new(rng.gen_range(29.0..29.1), rng.gen_range(-111.0..-110.9)))
            .collect::<Vec<_>>();
        let total = route_length(&points);
        for k in 0..points.len() {
            let split = route_length(&points[..=k]) + route_length(&points[k..]);
            assert_approx_eq!(split, total, 1e-6);
        }
    }

    #[test]
    fn degenerate_lengths() {
        assert_eq!(route_length(&[]), 0.0);
        assert_eq!(route_length(&[GeoPoint::new(29.07, -110.95)]), 0.0);
    }

    #[test]
    fn wire_format_is_lat_lon_pair() {
        let point = GeoPoint::new(29.0729, -110.9559);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, "[29.0729,-110.9559]");
    }
}
