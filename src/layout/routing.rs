use log::{debug, trace, warn};

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, Vector2};

use super::error::Result;
use super::types::{ArrowHead, Link, PathStyle};
use super::windrose::{self, EdgeSide, Windrose};
use super::Diagram;

/// A routed connector with the compass positions actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub points: Vec<Point>,
    pub source_position: Windrose,
    pub target_position: Windrose,
}

/// Replaces `auto` endpoints with the direction facing the other box.
/// Orthogonal links only get cardinal directions.
pub fn resolve_positions(diagram: &Diagram, link: &Link, config: &LayoutConfig) -> (Windrose, Windrose) {
    let src = diagram.bindings(link.source);
    let dst = diagram.bindings(link.target);
    let cardinal_only = link.style == PathStyle::Orthogonal;
    let pick = |declared: Windrose, this: &Rect, other: &Rect| match declared {
        Windrose::Auto => windrose::resolve_auto(this, other, cardinal_only, config.intercardinal_ratio),
        dir => dir,
    };
    (
        pick(link.source_position, &src, &dst),
        pick(link.target_position, &dst, &src),
    )
}

/// Computes the polyline for a connector from the live bindings of its ends.
pub fn route(diagram: &Diagram, link: &Link, config: &LayoutConfig) -> Result<RoutedPath> {
    let (source_position, target_position) = resolve_positions(diagram, link, config);
    let src = diagram.bindings(link.source);
    let dst = diagram.bindings(link.target);
    let points = match link.style {
        PathStyle::Straight => straight_path(&src, source_position, &dst, target_position)?,
        PathStyle::Orthogonal => {
            orthogonal_path(&src, source_position, &dst, target_position, config)?
        }
    };
    trace!(
        "routed `{}`:{source_position} -> `{}`:{target_position} via {} points",
        diagram.node(link.source).name,
        diagram.node(link.target).name,
        points.len()
    );
    Ok(RoutedPath {
        points,
        source_position,
        target_position,
    })
}

pub fn straight_path(src: &Rect, src_dir: Windrose, dst: &Rect, dst_dir: Windrose) -> Result<Vec<Point>> {
    Ok(vec![windrose::resolve(src, src_dir)?, windrose::resolve(dst, dst_dir)?])
}

/// Manhattan route between two anchors.
///
/// Every consecutive pair of the result differs in exactly one axis, except
/// when both anchors coincide (boxes sharing an edge): then the result is the
/// degenerate `[s, s]`, which has no drawable extent.
pub fn orthogonal_path(
    src: &Rect,
    src_dir: Windrose,
    dst: &Rect,
    dst_dir: Windrose,
    config: &LayoutConfig,
) -> Result<Vec<Point>> {
    let s = windrose::resolve(src, src_dir)?;
    let e = windrose::resolve(dst, dst_dir)?;
    let src_side = src_dir.side()?;
    let dst_side = dst_dir.side()?;
    if s == e {
        debug!("anchors coincide at {s:?}, no orthogonal route");
        return Ok(vec![s, e]);
    }

    // The planner only handles sources leaving along a vertical normal;
    // horizontal ones are solved in transposed space.
    let transposed = !src_side.is_vertical_normal();
    let frame = Frame { transposed };
    let request = Request {
        s: frame.point(s),
        e: frame.point(e),
        src: frame.rect(src),
        dst: frame.rect(dst),
        src_side: frame.side(src_side),
        dst_side: frame.side(dst_side),
        clearance: config.clearance,
        detour: config.detour,
    };

    let candidates = request.candidates();
    let best = candidates
        .into_iter()
        .enumerate()
        .min_by_key(|(idx, path)| (request.crossings(path), *idx))
        .map(|(_, path)| path)
        .unwrap_or_else(|| vec![request.s, request.e]);

    let mut points: Vec<Point> = best.into_iter().map(|p| frame.point(p)).collect();
    points = simplify(points);
    if points.len() < 2 {
        return Ok(vec![s, e]);
    }
    Ok(points)
}

/// Optional x/y swap so horizontal and vertical cases share one planner.
#[derive(Clone, Copy)]
struct Frame {
    transposed: bool,
}

impl Frame {
    fn point(self, p: Point) -> Point {
        if self.transposed {
            Point::new(p.y, p.x)
        } else {
            p
        }
    }

    fn rect(self, r: &Rect) -> Rect {
        if self.transposed {
            Rect::new(r.min.y, r.min.x, r.max.y, r.max.x)
        } else {
            *r
        }
    }

    fn side(self, side: EdgeSide) -> EdgeSide {
        if !self.transposed {
            return side;
        }
        match side {
            EdgeSide::Top => EdgeSide::Left,
            EdgeSide::Left => EdgeSide::Top,
            EdgeSide::Bottom => EdgeSide::Right,
            EdgeSide::Right => EdgeSide::Bottom,
        }
    }
}

/// Routing problem with the source leaving through its top or bottom.
struct Request {
    s: Point,
    e: Point,
    src: Rect,
    dst: Rect,
    src_side: EdgeSide,
    dst_side: EdgeSide,
    clearance: i32,
    detour: i32,
}

impl Request {
    /// Candidate paths in order of preference.
    fn candidates(&self) -> Vec<Vec<Point>> {
        let (s, e, c) = (self.s, self.e, self.clearance);
        let sgn = self.src_side.normal().1;
        let (ndx, ndy) = self.dst_side.normal();
        let s1 = s.offset(0, sgn * c);
        let e1 = e.offset(ndx * c, ndy * c);
        let columns = self.outside_columns();

        let mut out = Vec::new();
        if self.dst_side == self.src_side {
            // Both leave the same way: each end covers half the cross gap.
            let mid = s.x + (e.x - s.x) / 2;
            out.push(vec![s, s1, Point::new(mid, s1.y), Point::new(mid, e1.y), e1, e]);
            let y = if sgn > 0 { s1.y.max(e1.y) } else { s1.y.min(e1.y) };
            out.push(vec![s, Point::new(s.x, y), Point::new(e.x, y), e]);
            for x in columns {
                out.push(vec![s, s1, Point::new(x, s1.y), Point::new(x, y), Point::new(e.x, y), e]);
                out.push(vec![s, Point::new(s.x, y), Point::new(x, y), Point::new(x, e1.y), e1, e]);
            }
        } else if self.dst_side == self.src_side.opposite() {
            let gap = (e.y - s.y) * sgn;
            if gap >= 2 * c {
                // Facing each other with room: bridge at the halfway line.
                let mid = s.y + (e.y - s.y) / 2;
                out.push(vec![s, Point::new(s.x, mid), Point::new(e.x, mid), e]);
            }
            for x in columns {
                out.push(vec![s, s1, Point::new(x, s1.y), Point::new(x, e1.y), e1, e]);
            }
        } else {
            // Perpendicular: one leg covers the whole remaining distance.
            if (e.y - s.y) * sgn >= c && (s.x - e.x) * ndx >= c {
                out.push(vec![s, Point::new(s.x, e.y), e]);
            }
            out.push(vec![s, s1, Point::new(e1.x, s1.y), e1, e]);
            let row = if sgn > 0 {
                self.src.max.y.max(self.dst.max.y) + self.detour
            } else {
                self.src.min.y.min(self.dst.min.y) - self.detour
            };
            out.push(vec![s, Point::new(s.x, row), Point::new(e1.x, row), e1, e]);
        }
        out
    }

    /// Vertical lines clear of both shapes by the detour offset, nearest
    /// (by total horizontal travel) first; ties prefer the right side.
    fn outside_columns(&self) -> [i32; 2] {
        let right = self.src.max.x.max(self.dst.max.x) + self.detour;
        let left = self.src.min.x.min(self.dst.min.x) - self.detour;
        let cost = |x: i32| (self.s.x - x).abs() + (self.e.x - x).abs();
        if cost(left) < cost(right) {
            [left, right]
        } else {
            [right, left]
        }
    }

    fn crossings(&self, path: &[Point]) -> usize {
        path.windows(2)
            .map(|seg| {
                usize::from(segment_crosses(seg[0], seg[1], &self.src))
                    + usize::from(segment_crosses(seg[0], seg[1], &self.dst))
            })
            .sum()
    }
}

/// True if an axis-aligned segment passes through the interior of `rect`.
fn segment_crosses(a: Point, b: Point, rect: &Rect) -> bool {
    if rect.is_empty() {
        return false;
    }
    if a.y == b.y {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        a.y > rect.min.y && a.y < rect.max.y && x0.max(rect.min.x) < x1.min(rect.max.x)
    } else if a.x == b.x {
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        a.x > rect.min.x && a.x < rect.max.x && y0.max(rect.min.y) < y1.min(rect.max.y)
    } else {
        true
    }
}

/// Drops repeated points and interior points of straight runs.
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear = (a.x == b.x && b.x == p.x) || (a.y == b.y && b.y == p.y);
            let reverses = (b.x - a.x) * (p.x - b.x) < 0 || (b.y - a.y) * (p.y - b.y) < 0;
            if collinear && !reverses {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

/// Triangle `[tip, left, right]` for an arrowhead pointing from `origin` to
/// `tip`. Headless widths and zero-length shafts yield `None`.
pub fn arrowhead_points(tip: Vector2, origin: Vector2, head: &ArrowHead) -> Option<[Vector2; 3]> {
    let (a, b, c) = head.width.ratios();
    if b == 0.0 || head.length <= 0 {
        return None;
    }
    let dir = (tip - origin).normalize();
    if dir == Vector2::ZERO {
        warn!("arrowhead at {tip:?} has no direction; skipped");
        return None;
    }
    let length = head.length as f64;
    let back = tip - dir * (length * a / b);
    let side = dir.perpendicular() * (length * c / b);
    Some([tip, back + side, back - side])
}
