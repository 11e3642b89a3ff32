use super::{distance, GeoPoint};

/// Decimates a sequence of points by distance.
///
/// The first point is kept as the anchor. Each following point is kept only if
/// it lies more than `tolerance` metres from the current anchor, in which case
/// it becomes the new anchor. The last point is always kept.
///
/// This is not Douglas-Peucker: a sharp turn made of points closer together
/// than `tolerance` is dropped.
pub fn simplify_points(points: &[GeoPoint], tolerance: f64) -> Vec<GeoPoint> {
    let (first, last) = match points {
        [] => return vec![],
        [_] | [_, _] => return points.to_vec(),
        [first, .., last] => (*first, *last),
    };

    let mut kept = vec![first];
    let mut anchor = first;
    for point in &points[1..points.len() - 1] {
        if distance(anchor, *point) > tolerance {
            kept.push(*point);
            anchor = *point;
        }
    }
    kept.push(last);
    kept
}
