//! Geometry on latitude/longitude coordinates.

use cgmath::{Point2, Vector2};
pub use geodesy::{distance, route_length, GeoPoint, EARTH_RADIUS};
pub use lut::DistanceTable;
pub use nearest::{nearest, Nearest};
pub use simplify::simplify_points;
pub use util::*;

mod geodesy;
mod lut;
mod nearest;
mod simplify;
mod util;

/// A point in degree-space, with `x` the latitude and `y` the longitude.
pub type Point2d = Point2<f64>;

/// A displacement in degree-space.
pub type Vector2d = Vector2<f64>;
