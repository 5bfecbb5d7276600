use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Floating point 2D vector used for connector and arrowhead math.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction. Zero-length input yields zero.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::ZERO;
        }
        self.scale(1.0 / len)
    }

    /// Rotated 90 degrees clockwise in screen space (y grows downward).
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<Point> for Vector2 {
    fn from(point: Point) -> Self {
        Self::new(point.x as f64, point.y as f64)
    }
}

/// Integer pixel-grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle with integer corners. Zero-area rectangles are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min: Point::new(min_x, min_y),
            max: Point::new(max_x, max_y),
        }
    }

    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub const fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            min: self.min.offset(dx, dy),
            max: self.max.offset(dx, dy),
        }
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(
            (self.min.x + self.max.x) as f64 / 2.0,
            (self.min.y + self.max.y) as f64 / 2.0,
        )
    }

    /// Grows the rectangle outward by the given edge amounts.
    pub const fn expand(self, top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self::new(
            self.min.x - left,
            self.min.y - top,
            self.max.x + right,
            self.max.y + bottom,
        )
    }

    pub fn union(self, other: Self) -> Self {
        Self::new(
            self.min.x.min(other.min.x),
            self.min.y.min(other.min.y),
            self.max.x.max(other.max.x),
            self.max.y.max(other.max.y),
        )
    }

    /// Strict interior containment; points on the border are outside.
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.min.x as f64 && x < self.max.x as f64 && y > self.min.y as f64 && y < self.max.y as f64
    }
}

/// External spacing a node asks its parent to respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Margin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Margin {
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const ZERO: Self = Self::new(0, 0, 0, 0);
}

/// Internal spacing a composite node reserves around its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Padding {
    pub const fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const ZERO: Self = Self::new(0, 0, 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_normalize_and_perpendicular() {
        let v = Vector2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        let unit = v.normalize();
        assert!((unit.length() - 1.0).abs() < 1e-12);
        let perp = unit.perpendicular();
        assert!(perp.dot(unit).abs() < 1e-12);
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
    }

    #[test]
    fn rect_expand_and_union() {
        let a = Rect::from_size(64, 64).expand(30, 100, 30, 100);
        assert_eq!(a, Rect::new(-100, -30, 164, 94));
        let b = Rect::new(200, 0, 210, 10);
        assert_eq!(a.union(b), Rect::new(-100, -30, 210, 94));
    }

    #[test]
    fn strict_containment_excludes_border() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains_strict(5.0, 5.0));
        assert!(!r.contains_strict(0.0, 5.0));
        assert!(!r.contains_strict(10.0, 10.0));
    }
}
