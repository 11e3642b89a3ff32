use super::{distance, GeoPoint};
use crate::util::Interval;

/// A table of cumulative distances along a sequence of points.
///
/// Entry `i` holds the distance travelled from the first point to point `i`,
/// so the first entry is always zero and the last is the total length.
#[derive(Clone, Debug)]
pub struct DistanceTable {
    cumulative: Vec<f64>,
}

impl DistanceTable {
    /// Builds the table for the given points.
    pub fn from_points(points: &[GeoPoint]) -> Self {
        let mut total = 0.0;
        let cumulative = points
            .iter()
            .enumerate()
            .map(|(idx, point)| {
                if idx > 0 {
                    total += distance(points[idx - 1], *point);
                }
                total
            })
            .collect();
        Self { cumulative }
    }

    /// The total distance covered by the table, in m.
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// The number of segments in the table.
    pub fn num_segments(&self) -> usize {
        self.cumulative.len().saturating_sub(1)
    }

    /// The cumulative range covered by the segment starting at point `idx`.
    pub fn segment(&self, idx: usize) -> Interval<f64> {
        Interval::new(self.cumulative[idx], self.cumulative[idx + 1])
    }

    /// The cumulative distance at each point.
    pub fn values(&self) -> &[f64] {
        &self.cumulative
    }

    /// Finds the segment containing the given distance.
    ///
    /// Returns the index of the segment's first point and the fraction of the
    /// way along the segment, or `None` if the table has no segments.
    /// Distances beyond either end are clamped onto the first or last segment.
    pub fn locate(&self, dist: f64) -> Option<(usize, f64)> {
        let num_segments = self.num_segments();
        if num_segments == 0 {
            return None;
        }

        // First segment whose end reaches the target distance
        let idx = self.cumulative[1..].partition_point(|end| *end < dist);
        let idx = usize::min(idx, num_segments - 1);

        let segment = self.segment(idx);
        let ratio = if segment.length() > 0.0 {
            segment.inv_lerp(dist).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some((idx, ratio))
    }
}
