use crate::math::{nearest, simplify_points, DistanceTable, GeoPoint, Nearest};
use anyhow::bail;
use serde::{Deserialize, Serialize};

pub use compose::RouteComposer;
pub use sample::RouteSample;

mod compose;
mod sample;

/// An ordered, non-empty sequence of points, in the direction of travel.
///
/// A route is immutable; simplifying or composing produces a new route.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct Route {
    /// The points along the route.
    points: Vec<GeoPoint>,
    /// Cumulative distance at each point.
    table: DistanceTable,
}

impl Route {
    /// Creates a route from the given points, or `None` if there are none.
    pub fn new(points: Vec<GeoPoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let table = DistanceTable::from_points(&points);
        Some(Self { points, table })
    }

    /// Creates a route consisting of a single point.
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            points: vec![point],
            table: DistanceTable::from_points(&[point]),
        }
    }

    /// Creates a straight route between two points.
    pub fn line(start: GeoPoint, end: GeoPoint) -> Self {
        let points = vec![start, end];
        let table = DistanceTable::from_points(&points);
        Self { points, table }
    }

    /// The points along the route.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// The number of points in the route.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, as a route has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The first point of the route.
    pub fn first(&self) -> GeoPoint {
        self.points[0]
    }

    /// The last point of the route.
    pub fn last(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// The total length of the route in m.
    pub fn length(&self) -> f64 {
        self.table.total()
    }

    /// The length of each segment in m, in order.
    pub fn segment_lengths(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.table.num_segments()).map(|idx| self.table.segment(idx).length())
    }

    /// The cumulative distance from the start to each point in m.
    pub fn cumulative_distances(&self) -> &[f64] {
        self.table.values()
    }

    /// Returns a new route decimated by distance; see [simplify_points].
    pub fn simplify(&self, tolerance: f64) -> Route {
        let points = simplify_points(&self.points, tolerance);
        let table = DistanceTable::from_points(&points);
        Self { points, table }
    }

    /// Finds the route point closest to `target`.
    pub fn nearest(&self, target: GeoPoint) -> Nearest {
        match nearest(target, &self.points) {
            Some(nearest) => nearest,
            None => unreachable!("routes are never empty"),
        }
    }
}

impl TryFrom<Vec<GeoPoint>> for Route {
    type Error = anyhow::Error;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        match Route::new(points) {
            Some(route) => Ok(route),
            None => bail!("a route must contain at least one point"),
        }
    }
}

impl From<Route> for Vec<GeoPoint> {
    fn from(route: Route) -> Self {
        route.points
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}
