use crate::geometry::{Point, Vector2};

/// Which side of the direction of travel a label sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Left,
    Right,
}

/// Offset from a point on a line to the top-left corner of a label box of
/// size `extent`, keeping the whole box on the `d` side of the line.
///
/// `d` is first made orthogonal to the unit tangent `t`; the box is then
/// pushed along it by its own half-extent measured in that direction, so its
/// nearest edge just touches the line. Zero-length input yields zero.
pub fn label_offset(t: Vector2, d: Vector2, extent: Vector2) -> Vector2 {
    let t = t.normalize();
    let normal = (d - t * d.dot(t)).normalize();
    if normal == Vector2::ZERO {
        return Vector2::ZERO;
    }
    let reach = (extent.x * normal.x).abs() / 2.0 + (extent.y * normal.y).abs() / 2.0;
    normal * reach - extent * 0.5
}

/// Anchor point and unit tangent for a label `distance` pixels along the
/// first (or last) segment of `points`, measured from the endpoint.
pub fn segment_anchor(points: &[Point], at_source: bool, distance: f64) -> Option<(Vector2, Vector2)> {
    if points.len() < 2 {
        return None;
    }
    let (from, to) = if at_source {
        (points[0], points[1])
    } else {
        (points[points.len() - 1], points[points.len() - 2])
    };
    let from = Vector2::from(from);
    let to = Vector2::from(to);
    let along = to - from;
    let len = along.length();
    if len <= f64::EPSILON {
        return None;
    }
    let t = along.normalize();
    Some((from + t * distance.min(len / 2.0), t))
}

/// Unit normal pointing to `side` of travel direction `t` (screen space).
pub fn side_normal(t: Vector2, side: LabelSide) -> Vector2 {
    match side {
        LabelSide::Right => t.perpendicular(),
        LabelSide::Left => -t.perpendicular(),
    }
}
