use super::{GeoPoint, Point2d, Vector2d};
use cgmath::prelude::*;

/// Linearly interpolates between two points in degree-space.
///
/// Latitude and longitude are interpolated independently, which is a fair
/// approximation over the short segments of a city street but not along a
/// great circle.
///
/// # Parameters
/// * `a` - The point at `t = 0`
/// * `b` - The point at `t = 1`
/// * `t` - The interpolation factor
pub fn lerp_planar(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    let p = a.to_planar().to_vec().lerp(b.to_planar().to_vec(), t);
    GeoPoint::from_planar(Point2d::from_vec(p))
}

/// The planar bearing from `a` to `b` in degrees, measured from north
/// towards east. This is `atan2(Δlon, Δlat)` and not a great-circle bearing.
pub fn planar_heading(a: GeoPoint, b: GeoPoint) -> f64 {
    heading_of(b.to_planar() - a.to_planar())
}

/// The heading of a degree-space vector in degrees; zero for a zero vector.
pub fn heading_of(vec: Vector2d) -> f64 {
    vec.y.atan2(vec.x).to_degrees()
}
