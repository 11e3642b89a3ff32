use super::Route;
use crate::math::{lerp_planar, planar_heading, GeoPoint};
use serde::{Deserialize, Serialize};

/// The result of sampling a [Route] at some progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSample {
    /// The interpolated position.
    pub position: GeoPoint,
    /// The planar heading of the current segment in degrees, clockwise from north.
    pub heading_degrees: f64,
    /// The index of the first point of the current segment.
    pub segment_index: usize,
}

impl Route {
    /// Samples the route at the given progress.
    ///
    /// # Parameters
    /// * `progress` - The fraction of the route's length travelled, from 0 to 1.
    ///   Values below zero (and NaN) are treated as zero.
    ///
    /// At `progress >= 1` the last point is returned with a heading of zero,
    /// as there's no direction of travel at the terminus.
    pub fn sample(&self, progress: f64) -> RouteSample {
        let last_idx = self.points.len() - 1;
        if progress >= 1.0 {
            return RouteSample {
                position: self.points[last_idx],
                heading_degrees: 0.0,
                segment_index: last_idx,
            };
        }

        let progress = if progress > 0.0 { progress } else { 0.0 };
        let target = progress * self.length();
        match self.table.locate(target) {
            Some((idx, ratio)) => {
                let (start, end) = (self.points[idx], self.points[idx + 1]);
                RouteSample {
                    position: lerp_planar(start, end, ratio),
                    heading_degrees: planar_heading(start, end),
                    segment_index: idx,
                }
            }
            // A single point route
            None => RouteSample {
                position: self.points[0],
                heading_degrees: 0.0,
                segment_index: 0,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};

    #[test]
    fn ends_are_exact() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"Progress zero, progress one.....");
        for _i in 0..50 {
            let len = rng.gen_range(1..20);
            let points = (0..len)
                .map(|_| GeoPoint::new(rng.gen_range(29.0..29.1), rng.gen_range(-111.0..-110.9)))
                .collect::<Vec<_>>();
            let route = Route::new(points.clone()).unwrap();
            assert_eq!(route.sample(0.0).position, points[0]);
            assert_eq!(route.sample(1.0).position, points[len - 1]);
            assert_eq!(route.sample(1.0).segment_index, len - 1);
            assert_eq!(route.sample(1.0).heading_degrees, 0.0);
        }
    }

    #[test]
    fn midpoint_of_line() {
        let route = Route::line(GeoPoint::new(29.0, -110.0), GeoPoint::new(29.1, -110.0));
        let sample = route.sample(0.5);
        assert_approx_eq!(sample.position.lat, 29.05, 1e-9);
        assert_approx_eq!(sample.position.lon, -110.0, 1e-9);
        assert_approx_eq!(sample.heading_degrees, 0.0);
        assert_eq!(sample.segment_index, 0);
    }

    #[test]
    fn segment_and_heading() {
        // North for ~1.1 km, then east for ~1 km
        let route = Route::new(vec![
            GeoPoint::new(29.00, -110.00),
            GeoPoint::new(29.01, -110.00),
            GeoPoint::new(29.01, -109.99),
        ])
        .unwrap();
        let sample = route.sample(0.9);
        assert_eq!(sample.segment_index, 1);
        assert_approx_eq!(sample.heading_degrees, 90.0);
        assert_approx_eq!(sample.position.lat, 29.01, 1e-9);

        let sample = route.sample(0.1);
        assert_eq!(sample.segment_index, 0);
        assert_approx_eq!(sample.heading_degrees, 0.0);
    }

    #[test]
    fn degenerate_routes() {
        let point = GeoPoint::new(29.0729, -110.9559);
        let route = Route::from_point(point);
        for progress in [-1.0, 0.0, 0.3, 1.0, 7.0, f64::NAN] {
            let sample = route.sample(progress);
            assert_eq!(sample.position, point);
            assert_eq!(sample.segment_index, 0);
            assert_eq!(sample.heading_degrees, 0.0);
        }

        // Zero length, but more than one point
        let route = Route::new(vec![point, point, point]).unwrap();
        let sample = route.sample(0.5);
        assert_eq!(sample.position, point);
        assert!(!sample.heading_degrees.is_nan());
    }

    #[test]
    fn progress_is_clamped_below() {
        let route = Route::line(GeoPoint::new(29.0, -110.0), GeoPoint::new(29.1, -110.0));
        assert_eq!(route.sample(-0.5), route.sample(0.0));
        assert_eq!(route.sample(f64::NAN), route.sample(0.0));
    }
}
