use super::Route;
use crate::math::{nearest, simplify_points, GeoPoint};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Builds a plausible-looking path between two points out of fragments of
/// known street geometry, for when no routing engine is available.
///
/// The result is ordered by a greedy nearest-neighbour walk. It doesn't
/// minimise length or respect road connectivity; it is only meant to look
/// reasonable on a map.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteComposer {
    /// The fraction of each source route's points taken as candidates.
    pub window_fraction: f64,
    /// The largest fraction of a source route the window may be offset by
    /// when composing with a random number generator.
    pub jitter_fraction: f64,
    /// The tolerance used to thin out the candidates, in m.
    pub tolerance: f64,
}

impl Default for RouteComposer {
    fn default() -> Self {
        Self {
            window_fraction: 0.4,
            jitter_fraction: 0.3,
            tolerance: 50.0,
        }
    }
}

impl RouteComposer {
    /// Composes a route from `origin` to `destination`.
    ///
    /// # Parameters
    /// * `sources` - Street geometry to borrow waypoints from
    /// * `max_points` - The maximum number of points in the result,
    ///   including `origin` and `destination`. Values below 2 are treated as 2.
    pub fn compose(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        sources: &[Route],
        max_points: usize,
    ) -> Route {
        let candidates = sources
            .iter()
            .flat_map(|route| self.window(route, 0).iter().copied())
            .collect::<Vec<_>>();
        self.order(origin, destination, candidates, max_points)
    }

    /// Like [RouteComposer::compose], but each source route's window starts at
    /// a random offset, so repeated calls give different paths.
    pub fn compose_with_rng(
        &self,
        rng: &mut impl Rng,
        origin: GeoPoint,
        destination: GeoPoint,
        sources: &[Route],
        max_points: usize,
    ) -> Route {
        let candidates = sources
            .iter()
            .flat_map(|route| {
                let max_offset = (route.len() as f64 * self.jitter_fraction) as usize;
                let offset = if max_offset > 0 {
                    rng.gen_range(0..max_offset)
                } else {
                    0
                };
                self.window(route, offset).iter().copied()
            })
            .collect::<Vec<_>>();
        self.order(origin, destination, candidates, max_points)
    }

    /// The candidate waypoints taken from one source route.
    fn window<'a>(&self, route: &'a Route, offset: usize) -> &'a [GeoPoint] {
        let points = route.points();
        let size = (points.len() as f64 * self.window_fraction).ceil() as usize;
        let start = usize::min(offset, points.len());
        let end = usize::min(start + size, points.len());
        &points[start..end]
    }

    /// Thins out the candidates and strings them together greedily.
    fn order(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        candidates: Vec<GeoPoint>,
        max_points: usize,
    ) -> Route {
        if max_points < 2 {
            log::warn!("max_points of {max_points} can't fit both ends, using 2");
        }
        let max_waypoints = max_points.saturating_sub(2);

        let mut remaining = simplify_points(&candidates, self.tolerance);
        let mut points = Vec::with_capacity(usize::min(remaining.len(), max_waypoints) + 2);
        points.push(origin);

        let mut current = origin;
        while points.len() - 1 < max_waypoints {
            let Some(next) = nearest(current, &remaining) else {
                break;
            };
            // `remove` rather than `swap_remove` keeps tie-breaking stable
            current = remaining.remove(next.index);
            points.push(current);
        }
        points.push(destination);

        log::debug!(
            "Composed route of {} points from {} candidates",
            points.len(),
            candidates.len()
        );
        match Route::new(points) {
            Some(route) => route,
            None => Route::line(origin, destination),
        }
    }
}
