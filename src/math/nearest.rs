use super::{distance, GeoPoint};
use serde::{Deserialize, Serialize};

/// The result of a [nearest] query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nearest {
    /// The closest candidate.
    pub point: GeoPoint,
    /// The index of the closest candidate.
    pub index: usize,
    /// The haversine distance to the closest candidate, in m.
    pub distance: f64,
}

/// Finds the candidate closest to `target` by a linear scan.
///
/// Ties are resolved in favour of the earliest candidate.
/// Returns `None` if there are no candidates.
pub fn nearest(target: GeoPoint, candidates: &[GeoPoint]) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (index, point) in candidates.iter().enumerate() {
        let dist = distance(target, *point);
        if best.map_or(true, |best| dist < best.distance) {
            best = Some(Nearest {
                point: *point,
                index,
                distance: dist,
            });
        }
    }
    best
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn member_is_found_at_zero_distance() {
        let candidates = [
            GeoPoint::new(29.0729, -110.9559),
            GeoPoint::new(29.0969, -110.9544),
            GeoPoint::new(29.0892, -110.9614),
        ];
        for (idx, point) in candidates.iter().enumerate() {
            let result = nearest(*point, &candidates).unwrap();
            assert_eq!(result.index, idx);
            assert_eq!(result.point, *point);
            assert_eq!(result.distance, 0.0);
        }
    }

    #[test]
    fn ties_resolve_to_first() {
        let target = GeoPoint::new(29.0, -110.0);
        let candidates = [
            GeoPoint::new(29.1, -110.0),
            GeoPoint::new(29.01, -110.0),
            GeoPoint::new(29.01, -110.0),
        ];
        assert_eq!(nearest(target, &candidates).unwrap().index, 1);
    }

    #[test]
    fn empty_candidates() {
        assert_eq!(nearest(GeoPoint::new(0.0, 0.0), &[]), None);
    }
}
